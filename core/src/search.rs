//! Debounced remote search.
//!
//! A [`DebouncedSearch`] is one search session: keystrokes reschedule a
//! lookup that only fires once the input has been quiet for the debounce
//! delay. Every scheduled lookup is tagged with a generation number, and a
//! response is applied only while its generation is still the latest one
//! issued for the session. Results are published through a `watch` channel.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tracing::{debug, trace};

use crate::api::PantryApi;
use crate::candidate::{Candidate, candidates_for};
use crate::error::ApiResult;
use crate::models::Category;

pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);
pub const INGREDIENT_SEARCH_PAGE_SIZE: u32 = 200;
pub const CATEGORY_SEARCH_PAGE_SIZE: u32 = 50;

/// What a search session looks up.
pub trait Lookup: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    /// Shown when the lookup fails and the API gave no reason.
    const FAILURE_MESSAGE: &'static str;

    fn fetch(&self, query: &str) -> impl Future<Output = ApiResult<Vec<Self::Item>>> + Send;
}

/// Ingredient search; results end with the "add as new" candidate.
pub struct IngredientLookup<A> {
    api: Arc<A>,
    page_size: u32,
}

impl<A: PantryApi> IngredientLookup<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            page_size: INGREDIENT_SEARCH_PAGE_SIZE,
        }
    }
}

impl<A: PantryApi> Lookup for IngredientLookup<A> {
    type Item = Candidate;
    const FAILURE_MESSAGE: &'static str = "Failed to fetch ingredients";

    async fn fetch(&self, query: &str) -> ApiResult<Vec<Candidate>> {
        let page = self.api.search_ingredients(query, self.page_size).await?;
        Ok(candidates_for(query, page.ingredients))
    }
}

pub struct CategoryLookup<A> {
    api: Arc<A>,
    page_size: u32,
}

impl<A: PantryApi> CategoryLookup<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            page_size: CATEGORY_SEARCH_PAGE_SIZE,
        }
    }
}

impl<A: PantryApi> Lookup for CategoryLookup<A> {
    type Item = Category;
    const FAILURE_MESSAGE: &'static str = "Failed to fetch categories";

    async fn fetch(&self, query: &str) -> ApiResult<Vec<Category>> {
        let page = self.api.get_categories(Some(query), self.page_size, 0).await?;
        Ok(page.categories)
    }
}

#[derive(Debug, Clone)]
pub struct SearchState<T> {
    /// Query of the lookup the current `items` (or `error`) belong to.
    pub query: String,
    pub items: Vec<T>,
    /// A request is in flight.
    pub loading: bool,
    /// A lookup is scheduled and waiting out the debounce delay.
    pub pending: bool,
    pub error: Option<String>,
    pub generation: u64,
}

impl<T> Default for SearchState<T> {
    fn default() -> Self {
        Self {
            query: String::new(),
            items: Vec::new(),
            loading: false,
            pending: false,
            error: None,
            generation: 0,
        }
    }
}

impl<T> SearchState<T> {
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.pending && !self.loading
    }
}

pub struct DebouncedSearch<L: Lookup> {
    lookup: Arc<L>,
    delay: Duration,
    state: Arc<watch::Sender<SearchState<L::Item>>>,
    /// Dropping this cancels the scheduled lookup.
    cancel: Option<oneshot::Sender<()>>,
}

impl<L: Lookup> DebouncedSearch<L> {
    pub fn new(lookup: L) -> Self {
        Self::with_delay(lookup, DEBOUNCE_DELAY)
    }

    pub fn with_delay(lookup: L, delay: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            lookup: Arc::new(lookup),
            delay,
            state: Arc::new(state),
            cancel: None,
        }
    }

    /// Schedule a lookup for `query` once the debounce delay has passed,
    /// replacing any lookup still waiting. A blank query resets instead.
    ///
    /// Must be called from within a tokio runtime.
    pub fn search(&mut self, query: &str) {
        self.cancel.take();
        let query = query.trim();
        if query.is_empty() {
            self.reset();
            return;
        }

        let mut generation = 0;
        // A request still in flight belongs to an older generation and its
        // response will be dropped.
        self.state.send_modify(|s| {
            s.generation += 1;
            s.pending = true;
            s.loading = false;
            generation = s.generation;
        });

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        self.cancel = Some(cancel_tx);

        let lookup = Arc::clone(&self.lookup);
        let state = Arc::clone(&self.state);
        let delay = self.delay;
        let query = query.to_string();
        trace!(%query, generation, "search scheduled");

        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = cancel_rx => {
                    trace!(%query, generation, "search cancelled before firing");
                    return;
                }
            }

            let fired = state.send_if_modified(|s| {
                if s.generation != generation {
                    return false;
                }
                s.pending = false;
                s.loading = true;
                s.error = None;
                true
            });
            if !fired {
                return;
            }

            let result = lookup.fetch(&query).await;

            let applied = state.send_if_modified(|s| {
                if s.generation != generation {
                    return false;
                }
                s.loading = false;
                s.query.clone_from(&query);
                match result {
                    Ok(items) => {
                        s.items = items;
                        s.error = None;
                    }
                    Err(ref err) => {
                        s.items.clear();
                        s.error = Some(err.user_message(L::FAILURE_MESSAGE));
                    }
                }
                true
            });
            if !applied {
                debug!(%query, generation, "discarded stale search response");
            }
        });
    }

    /// Clear results and errors, cancel a waiting lookup and invalidate any
    /// request still in flight.
    pub fn reset(&mut self) {
        self.cancel.take();
        self.state.send_modify(|s| {
            s.generation += 1;
            s.query.clear();
            s.items.clear();
            s.loading = false;
            s.pending = false;
            s.error = None;
        });
    }

    #[must_use]
    pub fn snapshot(&self) -> SearchState<L::Item> {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn items(&self) -> Vec<L::Item> {
        self.state.borrow().items.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState<L::Item>> {
        self.state.subscribe()
    }

    /// Wait until nothing is scheduled or in flight, then return the state.
    pub async fn settled(&self) -> SearchState<L::Item> {
        let mut rx = self.state.subscribe();
        match rx.wait_for(SearchState::is_settled).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.snapshot(),
        }
    }
}

impl<L: Lookup> Drop for DebouncedSearch<L> {
    fn drop(&mut self) {
        self.cancel.take();
        self.state.send_if_modified(|s| {
            s.generation += 1;
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::error::ApiError;

    fn ingredient_search(api: &Arc<MockApi>) -> DebouncedSearch<IngredientLookup<MockApi>> {
        DebouncedSearch::new(IngredientLookup::new(Arc::clone(api)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_fires_after_quiet_period() {
        let api = Arc::new(MockApi::with_ingredients());
        let mut search = ingredient_search(&api);

        search.search("tom");
        assert!(search.snapshot().pending);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(api.search_calls().is_empty());

        let state = search.settled().await;
        assert_eq!(api.search_calls(), vec!["tom"]);
        assert_eq!(state.query, "tom");
        let labels: Vec<String> = state.items.iter().map(Candidate::label).collect();
        assert_eq!(
            labels,
            vec!["Tomato", "Tomato paste", "Add \"tom\" as an ingredient"]
        );
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_keystroke_wins() {
        let api = Arc::new(MockApi::with_ingredients());
        let mut search = ingredient_search(&api);

        search.search("t");
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.search("to");
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.search("tom");

        let state = search.settled().await;
        assert_eq!(api.search_calls(), vec!["tom"]);
        assert_eq!(state.query, "tom");
    }

    /// Echoes the query back, taking a second for "old".
    struct SlowEcho;

    impl Lookup for SlowEcho {
        type Item = String;
        const FAILURE_MESSAGE: &'static str = "Failed";

        async fn fetch(&self, query: &str) -> ApiResult<Vec<String>> {
            if query == "old" {
                tokio::time::sleep(Duration::from_millis(1000)).await;
            }
            Ok(vec![query.to_string()])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_request_is_not_loading() {
        let mut search = DebouncedSearch::new(SlowEcho);

        search.search("old");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(search.is_loading());

        // "old" is still in flight until t=1300.
        tokio::time::sleep(Duration::from_millis(850)).await;
        search.search("new");
        let state = search.snapshot();
        assert!(!state.loading);
        assert!(state.pending);

        // The old response has landed and "new" has not fired yet.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let state = search.snapshot();
        assert!(!state.loading);
        assert!(state.pending);
        assert!(state.items.is_empty());

        let state = search.settled().await;
        assert_eq!(state.items, vec!["new"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_dropped() {
        let mut search = DebouncedSearch::new(SlowEcho);

        search.search("old");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(search.is_loading());
        search.search("new");

        let state = search.settled().await;
        assert_eq!(state.query, "new");
        assert_eq!(state.items, vec!["new"]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let state = search.snapshot();
        assert_eq!(state.query, "new");
        assert_eq!(state.items, vec!["new"]);
        assert!(state.is_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_resets_without_request() {
        let api = Arc::new(MockApi::with_ingredients());
        let mut search = ingredient_search(&api);

        search.search("yam");
        search.settled().await;
        assert_eq!(search.items().len(), 2);

        search.search("   ");
        let state = search.snapshot();
        assert!(state.items.is_empty());
        assert!(state.is_settled());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.search_calls(), vec!["yam"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_lookup() {
        let api = Arc::new(MockApi::with_ingredients());
        let mut search = ingredient_search(&api);

        search.search("onion");
        search.reset();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(api.search_calls().is_empty());
        assert!(search.items().is_empty());
        assert!(!search.snapshot().pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_clears_results() {
        let api = Arc::new(MockApi::with_ingredients());
        let mut search = ingredient_search(&api);

        search.search("tom");
        search.settled().await;
        assert!(!search.items().is_empty());

        api.fail(ApiError::Transport("down".to_string()));
        search.search("toma");
        let state = search.settled().await;
        assert!(state.items.is_empty());
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Failed to fetch ingredients"));

        api.recover();
        search.search("tomat");
        let state = search.settled().await;
        assert!(state.error.is_none());
        assert_eq!(state.items.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_message_surfaces() {
        let api = Arc::new(MockApi::with_ingredients());
        api.fail(ApiError::Status {
            status: 503,
            message: Some("Search is warming up".to_string()),
        });
        let mut search = ingredient_search(&api);
        search.search("tom");
        let state = search.settled().await;
        assert_eq!(state.error.as_deref(), Some("Search is warming up"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let api = Arc::new(MockApi::with_ingredients());
        let mut search = ingredient_search(&api);
        let rx = search.subscribe();

        search.search("tom");
        drop(search);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(api.search_calls().is_empty());
        assert!(rx.borrow().items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_results() {
        let api = Arc::new(MockApi::with_ingredients());
        let mut search = ingredient_search(&api);
        let mut rx = search.subscribe();

        search.search("onion");
        let state = rx.wait_for(|s| s.query == "onion" && !s.loading).await.unwrap();
        assert_eq!(state.items.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_lookup() {
        let api = Arc::new(MockApi {
            categories: vec![
                Category {
                    id: 1,
                    name: "Soups".to_string(),
                },
                Category {
                    id: 2,
                    name: "Desserts".to_string(),
                },
            ],
            ..MockApi::default()
        });
        let mut search = DebouncedSearch::new(CategoryLookup::new(Arc::clone(&api)));
        search.search("sou");
        let state = search.settled().await;
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].name, "Soups");
    }
}
