use anyhow::{Context, Result};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use pantry_core::api::PantryApi;
use pantry_core::error::{ApiError, ApiResult};
use pantry_core::models::{
    CategoriesPage, CreatedUser, Cuisine, IngredientsPage, IngredientsPayload, Recipe,
    RecipeDetails, RecipeFilters, UpdateIngredient, User, UserIngredientsPage,
};

#[derive(Deserialize)]
struct RecommendationsResponse {
    recommendations: Vec<Recipe>,
}

#[derive(Deserialize)]
struct CuisinesResponse {
    cuisines: Vec<Cuisine>,
}

/// The recipe recommender's REST API over HTTP.
pub struct HttpPantryApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPantryApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("pantry-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, req: RequestBuilder) -> ApiResult<reqwest::Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        debug!(url = %resp.url(), status = status.as_u16(), "api response");
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), &body))
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        self.send(req)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl PantryApi for HttpPantryApi {
    async fn search_ingredients(&self, query: &str, page_size: u32) -> ApiResult<IngredientsPage> {
        let req = self
            .client
            .get(self.url("/ingredients"))
            .query(&[("query", query), ("pageSize", page_size.to_string().as_str())]);
        self.fetch(req).await
    }

    async fn create_user(
        &self,
        email: &str,
        ingredients: &IngredientsPayload,
    ) -> ApiResult<CreatedUser> {
        let req = self
            .client
            .post(self.url("/users"))
            .json(&json!({ "userEmail": email, "ingredients": ingredients }));
        self.fetch(req).await
    }

    async fn get_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let req = self.client.get(self.url("/users")).query(&[("email", email)]);
        match self.fetch(req).await {
            Ok(user) => Ok(Some(user)),
            Err(ApiError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn add_ingredients(
        &self,
        user_id: i64,
        ingredients: &IngredientsPayload,
    ) -> ApiResult<()> {
        let req = self
            .client
            .post(self.url(&format!("/users/{user_id}/ingredients")))
            .json(ingredients);
        self.send(req).await.map(drop)
    }

    async fn update_ingredient(
        &self,
        user_id: i64,
        user_ingredient_id: i64,
        ingredient: &UpdateIngredient,
    ) -> ApiResult<()> {
        let req = self
            .client
            .put(self.url(&format!("/users/{user_id}/ingredients/{user_ingredient_id}")))
            .json(&json!({ "ingredient": ingredient }));
        self.send(req).await.map(drop)
    }

    async fn remove_ingredients(&self, user_id: i64, user_ingredient_ids: &[i64]) -> ApiResult<()> {
        let req = self
            .client
            .delete(self.url(&format!("/users/{user_id}/ingredients")))
            .json(&json!({ "ids": user_ingredient_ids }));
        self.send(req).await.map(drop)
    }

    async fn get_user_ingredients(
        &self,
        user_id: i64,
        page_size: u32,
        offset: u32,
    ) -> ApiResult<UserIngredientsPage> {
        let req = self
            .client
            .get(self.url(&format!("/users/{user_id}/ingredients")))
            .query(&[("pageSize", page_size), ("offset", offset)]);
        self.fetch(req).await
    }

    async fn find_most_relevant_recipes(
        &self,
        user_id: i64,
        filters: RecipeFilters,
    ) -> ApiResult<Vec<Recipe>> {
        let mut params: Vec<(&str, i64)> = Vec::new();
        if let Some(id) = filters.category_id {
            params.push(("category_id", id));
        }
        if let Some(id) = filters.cuisine_id {
            params.push(("cuisine_id", id));
        }
        let req = self
            .client
            .get(self.url(&format!("/users/{user_id}/recommended-recipes")))
            .query(&params);
        let resp: RecommendationsResponse = self.fetch(req).await?;
        Ok(resp.recommendations)
    }

    async fn get_recipe_details(&self, user_id: i64, recipe_id: i64) -> ApiResult<RecipeDetails> {
        let req = self.client.get(self.url(&format!(
            "/users/{user_id}/recommended-recipes/{recipe_id}"
        )));
        self.fetch(req).await
    }

    async fn get_categories(
        &self,
        query: Option<&str>,
        page_size: u32,
        offset: u32,
    ) -> ApiResult<CategoriesPage> {
        let mut params = vec![
            ("pageSize", page_size.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(q) = query {
            params.push(("query", q.to_string()));
        }
        let req = self.client.get(self.url("/categories")).query(&params);
        self.fetch(req).await
    }

    async fn get_cuisines(&self) -> ApiResult<Vec<Cuisine>> {
        let resp: CuisinesResponse = self.fetch(self.client.get(self.url("/cuisines"))).await?;
        Ok(resp.cuisines)
    }
}

/// Whether an error means the API could not be reached at all.
pub fn is_unreachable(err: &ApiError) -> bool {
    matches!(err, ApiError::Transport(_))
}
