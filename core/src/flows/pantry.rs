use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::PantryApi;
use crate::error::{ApiError, FlowError, ValidationError};
use crate::models::{Ingredient, UpdateIngredient, UserIngredient};
use crate::picker::IngredientPicker;

pub const PANTRY_PAGE_SIZE: u32 = 10;

const FAILED_TO_LOAD: &str = "Failed to load ingredients";
const FAILED_TO_ADD: &str = "Failed to add ingredient";
const FAILED_TO_UPDATE: &str = "Failed to update ingredient";
const FAILED_TO_DELETE: &str = "Failed to delete ingredient";

pub enum PantryMode<A: PantryApi> {
    Viewing,
    Adding(IngredientPicker<A>),
    Editing {
        user_ingredient_id: i64,
        picker: IngredientPicker<A>,
    },
}

impl<A: PantryApi> PantryMode<A> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Viewing => "viewing",
            Self::Adding(_) => "adding",
            Self::Editing { .. } => "editing",
        }
    }
}

/// One user's pantry: a paginated list plus add, edit and delete.
///
/// Every page load goes through `&mut self`, so a second load cannot start
/// while one is in flight. Any successful change brings the list back to its
/// first page.
pub struct PantryPage<A: PantryApi> {
    api: Arc<A>,
    user_id: i64,
    mode: PantryMode<A>,
    ingredients: Vec<UserIngredient>,
    offset: u32,
    has_more: bool,
    total: u32,
    list_error: Option<String>,
    action_error: Option<String>,
}

impl<A: PantryApi> PantryPage<A> {
    pub fn new(api: Arc<A>, user_id: i64) -> Self {
        Self {
            api,
            user_id,
            mode: PantryMode::Viewing,
            ingredients: Vec::new(),
            offset: 0,
            has_more: false,
            total: 0,
            list_error: None,
            action_error: None,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    #[must_use]
    pub fn mode(&self) -> &PantryMode<A> {
        &self.mode
    }

    #[must_use]
    pub fn ingredients(&self) -> &[UserIngredient] {
        &self.ingredients
    }

    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// 1-based page number of the current offset.
    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.offset / PANTRY_PAGE_SIZE + 1
    }

    /// Why the list could not be loaded.
    #[must_use]
    pub fn list_error(&self) -> Option<&str> {
        self.list_error.as_deref()
    }

    /// Why the last add, edit or delete failed.
    #[must_use]
    pub fn action_error(&self) -> Option<&str> {
        self.action_error.as_deref()
    }

    #[must_use]
    pub fn can_next(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub fn can_previous(&self) -> bool {
        self.offset > 0
    }

    pub async fn load_page(&mut self, offset: u32) -> Result<(), ApiError> {
        self.list_error = None;
        match self
            .api
            .get_user_ingredients(self.user_id, PANTRY_PAGE_SIZE, offset)
            .await
        {
            Ok(page) => {
                debug!(user_id = self.user_id, offset = page.offset, count = page.ingredients.len(), "pantry page loaded");
                self.ingredients = page.ingredients;
                self.offset = page.offset;
                self.has_more = page.has_more;
                self.total = page.total;
                Ok(())
            }
            Err(e) => {
                warn!(user_id = self.user_id, error = %e, "failed to load pantry");
                self.list_error = Some(e.user_message(FAILED_TO_LOAD));
                self.ingredients.clear();
                self.has_more = false;
                Err(e)
            }
        }
    }

    /// Load the following page. Returns `false` without a request when
    /// there is none.
    pub async fn next_page(&mut self) -> Result<bool, ApiError> {
        if !self.can_next() {
            return Ok(false);
        }
        self.load_page(self.offset + PANTRY_PAGE_SIZE).await?;
        Ok(true)
    }

    pub async fn previous_page(&mut self) -> Result<bool, ApiError> {
        if !self.can_previous() {
            return Ok(false);
        }
        self.load_page(self.offset.saturating_sub(PANTRY_PAGE_SIZE))
            .await?;
        Ok(true)
    }

    pub fn start_adding(&mut self) {
        self.action_error = None;
        self.mode = PantryMode::Adding(IngredientPicker::new(Arc::clone(&self.api), true));
    }

    /// Edit one pantry entry with a single-row picker holding its current
    /// ingredient.
    pub fn start_editing(&mut self, entry: &UserIngredient) {
        self.action_error = None;
        let current = Ingredient::existing(entry.ingredient_id, entry.display_name());
        self.mode = PantryMode::Editing {
            user_ingredient_id: entry.id,
            picker: IngredientPicker::with_selection(Arc::clone(&self.api), current),
        };
    }

    pub fn cancel(&mut self) {
        self.action_error = None;
        self.mode = PantryMode::Viewing;
    }

    /// The picker of the add or edit form.
    pub fn picker_mut(&mut self) -> Option<&mut IngredientPicker<A>> {
        match &mut self.mode {
            PantryMode::Viewing => None,
            PantryMode::Adding(picker) | PantryMode::Editing { picker, .. } => Some(picker),
        }
    }

    pub async fn save_add(&mut self) -> Result<(), FlowError> {
        let PantryMode::Adding(picker) = &self.mode else {
            return Err(FlowError::InvalidState("not adding ingredients"));
        };
        let payload = picker.payload();
        if payload.is_empty() {
            return Err(self.reject(ValidationError::NothingToAdd));
        }

        self.action_error = None;
        if let Err(e) = self.api.add_ingredients(self.user_id, &payload).await {
            return Err(self.fail(e, FAILED_TO_ADD));
        }
        info!(user_id = self.user_id, count = payload.len(), "ingredients added");
        self.finish_change().await;
        Ok(())
    }

    pub async fn save_edit(&mut self) -> Result<(), FlowError> {
        let PantryMode::Editing {
            user_ingredient_id,
            picker,
        } = &self.mode
        else {
            return Err(FlowError::InvalidState("not editing an ingredient"));
        };
        let user_ingredient_id = *user_ingredient_id;
        let Some(selected) = picker.selected().cloned() else {
            return Err(self.reject(ValidationError::NothingSelected));
        };

        self.action_error = None;
        let update = UpdateIngredient::from(selected);
        if let Err(e) = self
            .api
            .update_ingredient(self.user_id, user_ingredient_id, &update)
            .await
        {
            return Err(self.fail(e, FAILED_TO_UPDATE));
        }
        info!(user_id = self.user_id, user_ingredient_id, "ingredient updated");
        self.finish_change().await;
        Ok(())
    }

    pub async fn delete(&mut self, user_ingredient_id: i64) -> Result<(), FlowError> {
        self.action_error = None;
        if let Err(e) = self
            .api
            .remove_ingredients(self.user_id, &[user_ingredient_id])
            .await
        {
            return Err(self.fail(e, FAILED_TO_DELETE));
        }
        info!(user_id = self.user_id, user_ingredient_id, "ingredient removed");
        self.finish_change().await;
        Ok(())
    }

    fn reject(&mut self, err: ValidationError) -> FlowError {
        self.action_error = Some(err.to_string());
        err.into()
    }

    fn fail(&mut self, err: ApiError, fallback: &str) -> FlowError {
        warn!(user_id = self.user_id, mode = self.mode.name(), error = %err, "pantry change failed");
        self.action_error = Some(err.user_message(fallback));
        err.into()
    }

    /// The change went through; a failed reload only shows up as a list error.
    async fn finish_change(&mut self) {
        self.mode = PantryMode::Viewing;
        let _ = self.load_page(0).await;
    }
}
