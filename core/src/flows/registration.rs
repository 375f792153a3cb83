use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::PantryApi;
use crate::error::{FlowError, ValidationError};
use crate::models::validate_email;
use crate::picker::IngredientPicker;
use crate::routes::Route;
use crate::session::SessionStore;

pub const REGISTRATION_FAILED: &str =
    "Unfortunately, I was unable to create your account. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStep {
    CollectingEmail,
    CollectingIngredients,
    Submitting,
    Registered,
}

/// Two-step sign-up: an email, then at least one ingredient.
pub struct Registration<A: PantryApi> {
    api: Arc<A>,
    step: RegistrationStep,
    email: Option<String>,
    picker: IngredientPicker<A>,
    error: Option<String>,
    session_warning: Option<String>,
}

impl<A: PantryApi> Registration<A> {
    pub fn new(api: Arc<A>) -> Self {
        let picker = IngredientPicker::new(Arc::clone(&api), true);
        Self {
            api,
            step: RegistrationStep::CollectingEmail,
            email: None,
            picker,
            error: None,
            session_warning: None,
        }
    }

    #[must_use]
    pub fn step(&self) -> RegistrationStep {
        self.step
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Message to show under the current step, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Set when the account was created but the email could not be
    /// remembered on this machine.
    #[must_use]
    pub fn session_warning(&self) -> Option<&str> {
        self.session_warning.as_deref()
    }

    #[must_use]
    pub fn picker(&self) -> &IngredientPicker<A> {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut IngredientPicker<A> {
        &mut self.picker
    }

    /// Validate the email and move on to the ingredient step. An invalid
    /// email keeps the flow on the email step.
    pub fn submit_email(&mut self, email: &str) -> Result<(), ValidationError> {
        match validate_email(email) {
            Ok(email) => {
                self.email = Some(email);
                self.error = None;
                self.step = RegistrationStep::CollectingIngredients;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Create the account with whatever the picker holds.
    ///
    /// Nothing is sent when no ingredient is selected. On success the email
    /// is remembered in `session` and the flow lands on the home route. On
    /// failure the flow returns to the ingredient step with the picker
    /// untouched so the user can retry.
    pub async fn submit(&mut self, session: &SessionStore) -> Result<Route, FlowError> {
        if self.step != RegistrationStep::CollectingIngredients {
            return Err(FlowError::InvalidState("registration is not collecting ingredients"));
        }
        let Some(email) = self.email.clone() else {
            return Err(FlowError::InvalidState("no email submitted"));
        };

        let payload = self.picker.payload();
        if payload.is_empty() {
            let err = ValidationError::NoIngredients;
            self.error = Some(err.to_string());
            return Err(err.into());
        }

        self.error = None;
        self.step = RegistrationStep::Submitting;
        match self.api.create_user(&email, &payload).await {
            Ok(created) => {
                info!(user_id = created.id, ingredients = payload.len(), "account created");
                self.step = RegistrationStep::Registered;
                // The account exists from here on; a failed local write is
                // reported, never surfaced as a registration failure.
                if let Err(e) = session.set_email(&email) {
                    let reason = format!("{e:#}");
                    warn!(error = %reason, "could not remember the registered email");
                    self.session_warning = Some(reason);
                }
                Ok(Route::Home { email })
            }
            Err(e) => {
                warn!(error = %e, "account creation failed");
                self.error = Some(e.user_message(REGISTRATION_FAILED));
                self.step = RegistrationStep::CollectingIngredients;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Call, MockApi};
    use crate::candidate::Candidate;
    use crate::error::ApiError;
    use crate::models::{Ingredient, IngredientsPayload};

    fn setup() -> (Arc<MockApi>, Registration<MockApi>, tempfile::TempDir) {
        let api = Arc::new(MockApi::with_ingredients());
        let flow = Registration::new(Arc::clone(&api));
        (api, flow, tempfile::tempdir().unwrap())
    }

    fn select(flow: &mut Registration<MockApi>, ingredient: Ingredient) {
        let picker = flow.picker_mut();
        let row = match picker.rows().iter().find(|r| r.selected.is_none()) {
            Some(r) => r.id,
            None => picker.add_row().unwrap(),
        };
        picker.on_ingredient_select(row, Some(Candidate::from_ingredient(ingredient)));
    }

    #[test]
    fn test_bad_email_stays_on_email_step() {
        let (api, mut flow, _dir) = setup();
        let err = flow.submit_email("bad-email").unwrap_err();
        assert_eq!(err, ValidationError::EmailInvalid);
        assert_eq!(flow.step(), RegistrationStep::CollectingEmail);
        assert_eq!(
            flow.error(),
            Some("Oops, looks like your email address is not valid. Please try again.")
        );
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_blank_email_is_required() {
        let (_, mut flow, _dir) = setup();
        assert_eq!(flow.submit_email("   "), Err(ValidationError::EmailRequired));
        assert_eq!(flow.step(), RegistrationStep::CollectingEmail);
    }

    #[test]
    fn test_valid_email_advances() {
        let (_, mut flow, _dir) = setup();
        flow.submit_email("bad-email").unwrap_err();
        flow.submit_email(" ada@example.com ").unwrap();
        assert_eq!(flow.step(), RegistrationStep::CollectingIngredients);
        assert_eq!(flow.email(), Some("ada@example.com"));
        assert!(flow.error().is_none());
    }

    #[tokio::test]
    async fn test_submit_without_ingredients_sends_nothing() {
        let (api, mut flow, dir) = setup();
        let session = SessionStore::in_dir(dir.path());
        flow.submit_email("ada@example.com").unwrap();

        let err = flow.submit(&session).await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(ValidationError::NoIngredients)));
        assert!(flow.error().unwrap().starts_with("You need at least one ingredient"));
        assert_eq!(flow.step(), RegistrationStep::CollectingIngredients);
        assert!(api.calls().is_empty());
        assert_eq!(session.get_email().unwrap(), None);
    }

    #[tokio::test]
    async fn test_submit_before_email_is_rejected() {
        let (api, mut flow, dir) = setup();
        let session = SessionStore::in_dir(dir.path());
        let err = flow.submit(&session).await.unwrap_err();
        assert!(matches!(err, FlowError::InvalidState(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_sends_payload_once_and_stores_session() {
        let (api, mut flow, dir) = setup();
        let session = SessionStore::in_dir(dir.path());
        flow.submit_email("ada@example.com").unwrap();
        select(&mut flow, Ingredient::existing(1, "Tomato"));
        select(&mut flow, Ingredient::new_entry("newingredient"));

        let route = flow.submit(&session).await.unwrap();
        assert_eq!(
            route,
            Route::Home {
                email: "ada@example.com".to_string()
            }
        );
        assert_eq!(flow.step(), RegistrationStep::Registered);
        assert_eq!(
            api.calls(),
            vec![Call::CreateUser(
                "ada@example.com".to_string(),
                IngredientsPayload {
                    ingredients_in_db: vec![1],
                    ingredients_not_in_db: vec!["newingredient".to_string()],
                }
            )]
        );
        assert_eq!(session.get_email().unwrap().as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_unwritable_session_still_lands_home() {
        let (api, mut flow, dir) = setup();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let session = SessionStore::new(blocker.join("session"));
        flow.submit_email("ada@example.com").unwrap();
        select(&mut flow, Ingredient::existing(1, "Tomato"));

        let route = flow.submit(&session).await.unwrap();
        assert_eq!(
            route,
            Route::Home {
                email: "ada@example.com".to_string()
            }
        );
        assert_eq!(flow.step(), RegistrationStep::Registered);
        assert!(flow.session_warning().is_some());
        assert!(flow.error().is_none());
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_uses_server_message_and_allows_retry() {
        let (api, mut flow, dir) = setup();
        let session = SessionStore::in_dir(dir.path());
        flow.submit_email("ada@example.com").unwrap();
        select(&mut flow, Ingredient::existing(4, "Yam"));

        api.fail(ApiError::Status {
            status: 409,
            message: Some("Email already registered".to_string()),
        });
        let err = flow.submit(&session).await.unwrap_err();
        assert!(matches!(err, FlowError::Api(_)));
        assert_eq!(flow.error(), Some("Email already registered"));
        assert_eq!(flow.step(), RegistrationStep::CollectingIngredients);
        assert_eq!(flow.picker().payload().ingredients_in_db, vec![4]);
        assert_eq!(session.get_email().unwrap(), None);

        api.recover();
        flow.submit(&session).await.unwrap();
        assert_eq!(flow.step(), RegistrationStep::Registered);
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_without_server_message_uses_fallback() {
        let (api, mut flow, dir) = setup();
        let session = SessionStore::in_dir(dir.path());
        flow.submit_email("ada@example.com").unwrap();
        select(&mut flow, Ingredient::existing(4, "Yam"));

        api.fail(ApiError::Transport("connection refused".to_string()));
        flow.submit(&session).await.unwrap_err();
        assert_eq!(flow.error(), Some(REGISTRATION_FAILED));
    }
}
