use anyhow::Result;
use serde::Serialize;

use crate::session::SessionStore;

/// Where the client is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    Register,
    Home { email: String },
    RecipeDetails { user_id: i64, recipe_id: i64 },
    Pantry { user_id: i64 },
}

impl Route {
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Register => "/register".to_string(),
            Self::Home { email } => format!("/home/{email}"),
            Self::RecipeDetails { user_id, recipe_id } => {
                format!("/users/{user_id}/recipes/{recipe_id}")
            }
            Self::Pantry { user_id } => format!("/users/{user_id}/user-ingredients"),
        }
    }
}

/// A stored email lands on the home page, otherwise registration.
pub fn initial_route(session: &SessionStore) -> Result<Route> {
    Ok(match session.get_email()? {
        Some(email) => Route::Home { email },
        None => Route::Register,
    })
}
