use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::PantryApi;
use crate::error::{ApiError, ApiResult};
use crate::models::{Category, Cuisine, MissingBadge, Recipe, RecipeDetails, RecipeFilters, User};
use crate::search::{CategoryLookup, DebouncedSearch, SearchState};

/// The API returns at most a hundred recommendations, so they are paged here.
pub const RECIPES_PER_PAGE: usize = 10;

const FAILED_TO_FETCH_RECIPES: &str = "Failed to fetch recipes";
const FAILED_TO_FETCH_CUISINES: &str = "Failed to fetch cuisines";
const FAILED_TO_FETCH_DETAILS: &str = "Failed to fetch recipe details";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: usize,
}

/// Slice out 1-based `page` of `items`. Pages past the end come back empty.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let start = page.saturating_sub(1) * per_page;
    Page {
        items: items.iter().skip(start).take(per_page).cloned().collect(),
        total_pages: items.len().div_ceil(per_page),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Found(User),
    NotFound,
}

pub async fn lookup_user<A: PantryApi>(api: &A, email: &str) -> ApiResult<UserLookup> {
    Ok(match api.get_user_by_email(email).await? {
        Some(user) => UserLookup::Found(user),
        None => UserLookup::NotFound,
    })
}

/// Recommended recipes for one user, with category and cuisine filters.
pub struct Recommendations<A: PantryApi> {
    api: Arc<A>,
    user: User,
    filters: RecipeFilters,
    recipes: Vec<Recipe>,
    page: usize,
    error: Option<String>,
    category_search: DebouncedSearch<CategoryLookup<A>>,
    cuisines: Vec<Cuisine>,
}

impl<A: PantryApi> Recommendations<A> {
    pub fn new(api: Arc<A>, user: User) -> Self {
        let category_search = DebouncedSearch::new(CategoryLookup::new(Arc::clone(&api)));
        Self {
            api,
            user,
            filters: RecipeFilters::default(),
            recipes: Vec::new(),
            page: 1,
            error: None,
            category_search,
            cuisines: Vec::new(),
        }
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn filters(&self) -> RecipeFilters {
        self.filters
    }

    #[must_use]
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub fn current_page(&self) -> Page<Recipe> {
        paginate(&self.recipes, self.page, RECIPES_PER_PAGE)
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.recipes.len().div_ceil(RECIPES_PER_PAGE)
    }

    /// Fetch recommendations for the current filters and go back to page 1.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.error = None;
        self.page = 1;
        match self
            .api
            .find_most_relevant_recipes(self.user.id, self.filters)
            .await
        {
            Ok(recipes) => {
                debug!(user_id = self.user.id, count = recipes.len(), filters = ?self.filters, "recipes loaded");
                self.recipes = recipes;
                Ok(())
            }
            Err(e) => {
                warn!(user_id = self.user.id, error = %e, "failed to load recipes");
                self.error = Some(e.user_message(FAILED_TO_FETCH_RECIPES));
                self.recipes.clear();
                Err(e)
            }
        }
    }

    pub async fn set_category(&mut self, category_id: Option<i64>) -> Result<(), ApiError> {
        self.filters.category_id = category_id;
        self.load().await
    }

    pub async fn set_cuisine(&mut self, cuisine_id: Option<i64>) -> Result<(), ApiError> {
        self.filters.cuisine_id = cuisine_id;
        self.load().await
    }

    /// Jump to a page, clamped to the pages that exist.
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages().max(1));
    }

    pub fn next_page(&mut self) -> bool {
        if self.page >= self.total_pages() {
            return false;
        }
        self.page += 1;
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Debounced category lookup for the category filter.
    pub fn search_categories(&mut self, query: &str) {
        self.category_search.search(query);
    }

    #[must_use]
    pub fn category_results(&self) -> SearchState<Category> {
        self.category_search.snapshot()
    }

    pub async fn categories_settled(&self) -> SearchState<Category> {
        self.category_search.settled().await
    }

    pub async fn load_cuisines(&mut self) -> Result<&[Cuisine], ApiError> {
        match self.api.get_cuisines().await {
            Ok(cuisines) => {
                self.cuisines = cuisines;
                Ok(&self.cuisines)
            }
            Err(e) => {
                warn!(error = %e, "failed to load cuisines");
                self.error = Some(e.user_message(FAILED_TO_FETCH_CUISINES));
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn cuisines(&self) -> &[Cuisine] {
        &self.cuisines
    }
}

/// A recipe page as the user sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecipeView {
    Loaded {
        details: RecipeDetails,
        badge: MissingBadge,
    },
    NotFound,
    Failed {
        message: String,
    },
}

impl RecipeView {
    /// Headline above the ingredient list.
    #[must_use]
    pub fn headline(&self) -> &'static str {
        match self {
            Self::Loaded { badge, .. } => match badge {
                MissingBadge::AllSet => {
                    "You're all set, you've got every ingredient you need for this recipe"
                }
                MissingBadge::Few(_) => {
                    "You're really close! You only need these ingredient(s) below to make it"
                }
                MissingBadge::Many => {
                    "Your kitchen isn't stocked for this one yet. Here are the ingredient(s) you'd need:"
                }
            },
            Self::NotFound => "Recipe not found",
            Self::Failed { .. } => FAILED_TO_FETCH_DETAILS,
        }
    }
}

pub async fn load_recipe_details<A: PantryApi>(api: &A, user_id: i64, recipe_id: i64) -> RecipeView {
    match api.get_recipe_details(user_id, recipe_id).await {
        Ok(details) => {
            let badge = details.badge();
            RecipeView::Loaded { details, badge }
        }
        Err(ApiError::NotFound) => RecipeView::NotFound,
        Err(e) => {
            warn!(user_id, recipe_id, error = %e, "failed to load recipe details");
            RecipeView::Failed {
                message: e.user_message(FAILED_TO_FETCH_DETAILS),
            }
        }
    }
}
