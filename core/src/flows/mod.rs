//! Page-level state machines driving the picker and the API.

pub mod pantry;
pub mod recipes;
pub mod registration;

pub use pantry::{PANTRY_PAGE_SIZE, PantryMode, PantryPage};
pub use recipes::{
    Page, RECIPES_PER_PAGE, RecipeView, Recommendations, UserLookup, load_recipe_details,
    lookup_user, paginate,
};
pub use registration::{Registration, RegistrationStep};
