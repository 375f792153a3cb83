use std::future::Future;

use crate::error::ApiResult;
use crate::models::{
    CategoriesPage, CreatedUser, Cuisine, IngredientsPage, IngredientsPayload, Recipe,
    RecipeDetails, RecipeFilters, UpdateIngredient, User, UserIngredientsPage,
};

/// The remote recipe-recommendation API.
///
/// The CLI implements this with reqwest; tests use an in-memory mock. All
/// matching, normalization and persistence happen on the other side of this
/// trait.
pub trait PantryApi: Send + Sync + 'static {
    fn search_ingredients(
        &self,
        query: &str,
        page_size: u32,
    ) -> impl Future<Output = ApiResult<IngredientsPage>> + Send;

    fn create_user(
        &self,
        email: &str,
        ingredients: &IngredientsPayload,
    ) -> impl Future<Output = ApiResult<CreatedUser>> + Send;

    /// `Ok(None)` when no user is registered with this email.
    fn get_user_by_email(&self, email: &str)
    -> impl Future<Output = ApiResult<Option<User>>> + Send;

    fn add_ingredients(
        &self,
        user_id: i64,
        ingredients: &IngredientsPayload,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn update_ingredient(
        &self,
        user_id: i64,
        user_ingredient_id: i64,
        ingredient: &UpdateIngredient,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn remove_ingredients(
        &self,
        user_id: i64,
        user_ingredient_ids: &[i64],
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn get_user_ingredients(
        &self,
        user_id: i64,
        page_size: u32,
        offset: u32,
    ) -> impl Future<Output = ApiResult<UserIngredientsPage>> + Send;

    fn find_most_relevant_recipes(
        &self,
        user_id: i64,
        filters: RecipeFilters,
    ) -> impl Future<Output = ApiResult<Vec<Recipe>>> + Send;

    fn get_recipe_details(
        &self,
        user_id: i64,
        recipe_id: i64,
    ) -> impl Future<Output = ApiResult<RecipeDetails>> + Send;

    fn get_categories(
        &self,
        query: Option<&str>,
        page_size: u32,
        offset: u32,
    ) -> impl Future<Output = ApiResult<CategoriesPage>> + Send;

    fn get_cuisines(&self) -> impl Future<Output = ApiResult<Vec<Cuisine>>> + Send;
}
