use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedUser {
    pub id: i64,
}

/// An ingredient as the API knows it. `id` is `None` for an ingredient that
/// has not been persisted yet (typed in by the user).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Option<i64>,
    pub name: String,
}

impl Ingredient {
    #[must_use]
    pub fn existing(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn new_entry(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientsPage {
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub has_more: bool,
}

/// A pantry entry: the link between a user and one ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIngredient {
    pub id: i64,
    pub ingredient_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient: Option<Ingredient>,
}

impl UserIngredient {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.ingredient.as_ref().map_or("?", |i| i.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIngredientsPage {
    pub ingredients: Vec<UserIngredient>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub cuisine_id: Option<i64>,
    #[serde(default)]
    pub cook_time: Option<i64>,
    #[serde(default)]
    pub prep_time: Option<i64>,
    #[serde(default)]
    pub ratings: Option<String>,
    #[serde(default)]
    pub total_ingredients_needed_for_recipe: i64,
    #[serde(default)]
    pub total_ingredients_user_has_for_recipe: i64,
    #[serde(default)]
    pub total_ingredients_missing_for_recipe: i64,
}

impl Recipe {
    #[must_use]
    pub fn badge(&self) -> MissingBadge {
        MissingBadge::for_count(self.total_ingredients_missing_for_recipe)
    }

    #[must_use]
    pub fn cook_time_label(&self) -> Option<String> {
        match self.cook_time? {
            0 => Some("Does not require cooking".to_string()),
            minutes => Some(format!("Cooking Time: {minutes} min")),
        }
    }

    /// Prep time of zero is not worth showing.
    #[must_use]
    pub fn prep_time_label(&self) -> Option<String> {
        self.prep_time
            .filter(|m| *m != 0)
            .map(|m| format!("Preparation Time: {m} min"))
    }

    #[must_use]
    pub fn rating_label(&self) -> Option<String> {
        self.ratings
            .as_deref()
            .filter(|r| !r.is_empty())
            .map(|r| format!("Rating: {r}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub missing_ingredients: Vec<String>,
}

impl RecipeDetails {
    /// Based on the missing list itself rather than the summary counter.
    #[must_use]
    pub fn badge(&self) -> MissingBadge {
        MissingBadge::for_count(self.missing_ingredients.len() as i64)
    }
}

/// How far the user's pantry is from a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "missing", rename_all = "snake_case")]
pub enum MissingBadge {
    AllSet,
    Few(i64),
    Many,
}

pub const FEW_MISSING_LIMIT: i64 = 5;

impl MissingBadge {
    #[must_use]
    pub fn for_count(missing: i64) -> Self {
        match missing {
            n if n <= 0 => Self::AllSet,
            n if n <= FEW_MISSING_LIMIT => Self::Few(n),
            _ => Self::Many,
        }
    }

    #[must_use]
    pub fn message(self) -> String {
        match self {
            Self::AllSet => "You're all set, you can cook this right now!".to_string(),
            Self::Few(1) => {
                "You're super close to cooking this, you just need to grab 1 ingredient".to_string()
            }
            Self::Few(n) => format!(
                "You're super close to cooking this, you just need to grab {n} ingredients"
            ),
            Self::Many => "This one's a stretch, you're missing quite a few ingredients for this recipe."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesPage {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cuisine {
    pub id: i64,
    pub name: String,
}

/// Ingredients to save, split by whether the API already knows them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientsPayload {
    #[serde(rename = "ingredientsInDB")]
    pub ingredients_in_db: Vec<i64>,
    #[serde(rename = "ingredientsNotInDB")]
    pub ingredients_not_in_db: Vec<String>,
}

impl IngredientsPayload {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ingredients_in_db.is_empty() && self.ingredients_not_in_db.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ingredients_in_db.len() + self.ingredients_not_in_db.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecipeFilters {
    pub category_id: Option<i64>,
    pub cuisine_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateIngredient {
    pub id: Option<i64>,
    pub name: String,
}

impl From<Ingredient> for UpdateIngredient {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
        }
    }
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Validate an email address, returning it trimmed.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe() -> Recipe {
        Recipe {
            id: 7,
            name: "Jollof Rice".to_string(),
            image_url: None,
            category_id: Some(1),
            cuisine_id: None,
            cook_time: Some(45),
            prep_time: Some(15),
            ratings: Some("4.5".to_string()),
            total_ingredients_needed_for_recipe: 8,
            total_ingredients_user_has_for_recipe: 6,
            total_ingredients_missing_for_recipe: 2,
        }
    }

    #[test]
    fn test_validate_email_valid() {
        assert_eq!(validate_email("test@example.com").unwrap(), "test@example.com");
        assert_eq!(validate_email("  a@b.co ").unwrap(), "a@b.co");
    }

    #[test]
    fn test_validate_email_required() {
        assert_eq!(validate_email(""), Err(ValidationError::EmailRequired));
        assert_eq!(validate_email("   "), Err(ValidationError::EmailRequired));
    }

    #[test]
    fn test_validate_email_invalid() {
        for bad in ["bad-email", "a@b", "@example.com", "a b@example.com", "a@@b.com"] {
            assert_eq!(validate_email(bad), Err(ValidationError::EmailInvalid), "{bad}");
        }
    }

    #[test]
    fn test_missing_badge_thresholds() {
        assert_eq!(MissingBadge::for_count(0), MissingBadge::AllSet);
        assert_eq!(MissingBadge::for_count(1), MissingBadge::Few(1));
        assert_eq!(MissingBadge::for_count(5), MissingBadge::Few(5));
        assert_eq!(MissingBadge::for_count(6), MissingBadge::Many);
    }

    #[test]
    fn test_missing_badge_message_pluralizes() {
        assert!(MissingBadge::Few(1).message().contains("1 ingredient"));
        assert!(!MissingBadge::Few(1).message().contains("ingredients"));
        assert!(MissingBadge::Few(3).message().contains("3 ingredients"));
    }

    #[test]
    fn test_recipe_labels() {
        let mut recipe = sample_recipe();
        assert_eq!(recipe.cook_time_label().unwrap(), "Cooking Time: 45 min");
        assert_eq!(recipe.prep_time_label().unwrap(), "Preparation Time: 15 min");
        assert_eq!(recipe.rating_label().unwrap(), "Rating: 4.5");

        recipe.cook_time = Some(0);
        recipe.prep_time = Some(0);
        recipe.ratings = None;
        assert_eq!(recipe.cook_time_label().unwrap(), "Does not require cooking");
        assert!(recipe.prep_time_label().is_none());
        assert!(recipe.rating_label().is_none());
    }

    #[test]
    fn test_payload_wire_names() {
        let payload = IngredientsPayload {
            ingredients_in_db: vec![1],
            ingredients_not_in_db: vec!["yam".to_string()],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "ingredientsInDB": [1], "ingredientsNotInDB": ["yam"] })
        );
        assert_eq!(payload.len(), 2);
        assert!(!payload.is_empty());
        assert!(IngredientsPayload::default().is_empty());
    }

    #[test]
    fn test_recipe_details_flattened() {
        let json = serde_json::json!({
            "id": 3,
            "name": "Egusi Soup",
            "image_url": "https://img/egusi.png",
            "category_id": null,
            "cuisine_id": 2,
            "cook_time": 60,
            "prep_time": null,
            "ratings": null,
            "total_ingredients_needed_for_recipe": 9,
            "total_ingredients_user_has_for_recipe": 2,
            "total_ingredients_missing_for_recipe": 7,
            "ingredients": ["melon seed", "palm oil"],
            "missing_ingredients": ["stockfish"]
        });
        let details: RecipeDetails = serde_json::from_value(json).unwrap();
        assert_eq!(details.recipe.name, "Egusi Soup");
        assert_eq!(details.recipe.badge(), MissingBadge::Many);
        assert_eq!(details.badge(), MissingBadge::Few(1));
        assert_eq!(details.ingredients.len(), 2);
    }

    #[test]
    fn test_user_ingredient_display_name() {
        let ui = UserIngredient {
            id: 10,
            ingredient_id: 1,
            ingredient: Some(Ingredient::existing(1, "Tomato")),
        };
        assert_eq!(ui.display_name(), "Tomato");
        let bare = UserIngredient {
            id: 11,
            ingredient_id: 2,
            ingredient: None,
        };
        assert_eq!(bare.display_name(), "?");
    }
}
