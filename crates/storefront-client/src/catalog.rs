//! Catalog orchestration
//!
//! Every operation that touches the network brackets the fetch with
//! `SetLoading(true)` / `SetLoading(false)` and dispatches exactly one
//! terminal outcome in between: the data (clearing the error slot) or an
//! error message. Stale cache answers are dispatched immediately and
//! revalidated on a background task, whose fresh result is dispatched as a
//! second update.

use crate::fetch::CatalogFetcher;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use storefront_core::{
    filter_by_title, related_products, CatalogAction, CatalogState, CatalogStore, Category,
    CategoryId, FetchError, Product, ProductId, RELATED_LIMIT,
};
use tokio::task::JoinHandle;

/// Error slot message when the product list cannot be loaded
pub const LOAD_PRODUCTS_FAILED: &str = "Failed to load products";
/// Error slot message when a category's products cannot be loaded
pub const LOAD_CATEGORY_FAILED: &str = "Failed to load category products";
/// Error slot message when a server-side search fails
pub const SEARCH_FAILED: &str = "Failed to search products";

/// A product with the related products shown beside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetail {
    /// The product
    pub product: Product,
    /// Same-category products, excluding `product`
    pub related: Vec<Product>,
}

/// Drives the catalog store from the catalog service
pub struct CatalogController {
    store: Arc<CatalogStore>,
    fetcher: CatalogFetcher,
    revalidations: Mutex<Vec<JoinHandle<()>>>,
}

impl CatalogController {
    /// Create controller
    #[must_use]
    pub fn new(store: Arc<CatalogStore>, fetcher: CatalogFetcher) -> Self {
        Self {
            store,
            fetcher,
            revalidations: Mutex::new(Vec::new()),
        }
    }

    /// Store this controller dispatches into
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// Snapshot of the catalog state
    #[inline]
    #[must_use]
    pub fn state(&self) -> CatalogState {
        self.store.state()
    }

    fn spawn_revalidation(&self, task: impl Future<Output = ()> + Send + 'static) {
        let mut pending = self.revalidations.lock();
        pending.retain(|handle| !handle.is_finished());
        pending.push(tokio::spawn(task));
    }

    /// Wait for every background revalidation started so far
    pub async fn settle(&self) {
        let pending = std::mem::take(&mut *self.revalidations.lock());
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "revalidation task failed");
            }
        }
    }

    /// Load the full product list
    ///
    /// On success the list replaces both `products` and the filtered view.
    /// A stale answer is revalidated in the background; the fresh list is
    /// only dispatched if no search or category is active by then, since it
    /// would reset the view under the current selection. The refreshed cache
    /// serves the next load either way.
    ///
    /// # Errors
    /// The `FetchError`; the store then carries [`LOAD_PRODUCTS_FAILED`].
    pub async fn load_products(&self) -> Result<(), FetchError> {
        self.store.apply(CatalogAction::SetLoading(true));

        let outcome = match self.fetcher.products().await {
            Ok(cached) => {
                let stale = cached.is_stale();
                tracing::info!(count = cached.value.len(), stale, "products loaded");
                self.store.apply(CatalogAction::SetProducts(cached.value));
                self.store.apply(CatalogAction::SetError(None));

                if stale {
                    let fetcher = self.fetcher.clone();
                    let store = Arc::clone(&self.store);
                    self.spawn_revalidation(async move {
                        match fetcher.refresh_products().await {
                            Ok(fresh) if store.with_state(CatalogState::is_unscoped) => {
                                tracing::debug!(count = fresh.len(), "products revalidated");
                                store.apply(CatalogAction::SetProducts(fresh));
                            }
                            Ok(_) => tracing::debug!("view is scoped, product revalidation not applied"),
                            Err(e) => tracing::warn!(error = %e, "product revalidation failed"),
                        }
                    });
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load products");
                self.store
                    .apply(CatalogAction::SetError(Some(LOAD_PRODUCTS_FAILED.to_string())));
                Err(e)
            }
        };

        self.store.apply(CatalogAction::SetLoading(false));
        outcome
    }

    /// Filter the loaded products by title
    ///
    /// Records the raw query and replaces the view with the matches; an
    /// empty query shows everything.
    pub fn search(&self, query: &str) {
        let matches = self
            .store
            .with_state(|state| filter_by_title(&state.products, query));
        tracing::debug!(query, matches = matches.len(), "local search");

        self.store.apply(CatalogAction::SetSearchQuery(query.to_string()));
        self.store.apply(CatalogAction::SetFilteredProducts(matches));
    }

    /// Clear the search text and show every loaded product
    pub fn clear_search(&self) {
        self.search("");
    }

    /// Scope the view to one category using the server's category listing
    ///
    /// # Errors
    /// The `FetchError`; the store then carries [`LOAD_CATEGORY_FAILED`] and
    /// the view and selection are left as they were.
    pub async fn select_category(&self, id: CategoryId) -> Result<(), FetchError> {
        self.store.apply(CatalogAction::SetLoading(true));

        let outcome = match self.fetcher.category_products(id).await {
            Ok(cached) => {
                let stale = cached.is_stale();
                tracing::info!(category = %id, count = cached.value.len(), stale, "category loaded");
                self.store.apply(CatalogAction::SetFilteredProducts(cached.value));
                self.store.apply(CatalogAction::SetSelectedCategory(Some(id)));
                self.store.apply(CatalogAction::SetError(None));

                if stale {
                    let fetcher = self.fetcher.clone();
                    let store = Arc::clone(&self.store);
                    self.spawn_revalidation(async move {
                        match fetcher.refresh_category_products(id).await {
                            // Dropped if the user moved to another category meanwhile
                            Ok(fresh) if store.with_state(|s| s.selected_category == Some(id)) => {
                                store.apply(CatalogAction::SetFilteredProducts(fresh));
                            }
                            Ok(_) => tracing::debug!(category = %id, "selection changed, revalidation dropped"),
                            Err(e) => tracing::warn!(category = %id, error = %e, "category revalidation failed"),
                        }
                    });
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(category = %id, error = %e, "failed to load category products");
                self.store
                    .apply(CatalogAction::SetError(Some(LOAD_CATEGORY_FAILED.to_string())));
                Err(e)
            }
        };

        self.store.apply(CatalogAction::SetLoading(false));
        outcome
    }

    /// Drop the category scope and re-apply the current search locally
    pub fn clear_category(&self) {
        self.store.apply(CatalogAction::SetSelectedCategory(None));
        let view = self
            .store
            .with_state(|state| filter_by_title(&state.products, &state.search_query));
        self.store.apply(CatalogAction::SetFilteredProducts(view));
    }

    /// Search titles on the server
    ///
    /// A blank query is handled locally by [`CatalogController::search`],
    /// which still records the raw text.
    ///
    /// # Errors
    /// The `FetchError`; the store then carries [`SEARCH_FAILED`].
    pub async fn search_remote(&self, query: &str) -> Result<(), FetchError> {
        if query.trim().is_empty() {
            self.search(query);
            return Ok(());
        }

        self.store.apply(CatalogAction::SetLoading(true));
        self.store.apply(CatalogAction::SetSearchQuery(query.to_string()));

        let outcome = match self.fetcher.search(query).await {
            Ok(cached) => {
                tracing::info!(query, count = cached.value.len(), "remote search");
                self.store.apply(CatalogAction::SetFilteredProducts(cached.value));
                self.store.apply(CatalogAction::SetError(None));
                Ok(())
            }
            Err(e) => {
                tracing::error!(query, error = %e, "remote search failed");
                self.store
                    .apply(CatalogAction::SetError(Some(SEARCH_FAILED.to_string())));
                Err(e)
            }
        };

        self.store.apply(CatalogAction::SetLoading(false));
        outcome
    }

    /// All categories
    ///
    /// Does not touch the store. A stale answer is refreshed in the
    /// background for the next caller.
    ///
    /// # Errors
    /// `FetchError` when nothing is cached and the network read fails.
    pub async fn categories(&self) -> Result<Vec<Category>, FetchError> {
        let cached = self.fetcher.categories().await?;
        if cached.is_stale() {
            let fetcher = self.fetcher.clone();
            self.spawn_revalidation(async move {
                if let Err(e) = fetcher.refresh_categories().await {
                    tracing::warn!(error = %e, "category list revalidation failed");
                }
            });
        }
        Ok(cached.value)
    }

    /// A product with up to [`RELATED_LIMIT`] related products
    ///
    /// Related products come from the product's category; if that listing
    /// fails the detail is returned without them.
    ///
    /// # Errors
    /// `FetchError` when the product itself cannot be read.
    pub async fn product_detail(&self, id: ProductId) -> Result<ProductDetail, FetchError> {
        let product = self.fetcher.product(id).await?.value;

        let related = match self.fetcher.category_products(product.category.id).await {
            Ok(cached) => related_products(&cached.value, product.id, RELATED_LIMIT),
            Err(e) => {
                tracing::warn!(product = %id, error = %e, "related products unavailable");
                Vec::new()
            }
        };

        Ok(ProductDetail { product, related })
    }
}

impl std::fmt::Debug for CatalogController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogController")
            .field("fetcher", &self.fetcher)
            .field("pending_revalidations", &self.revalidations.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockCatalogApi;
    use crate::cache::ResponseCache;
    use crate::retry::RetryPolicy;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::time::Duration;
    use storefront_core::Resource;

    fn product(id: u64, title: &str, category: u64) -> Product {
        Product::new(
            ProductId(id),
            title,
            Decimal::from(10 * id),
            Category::new(CategoryId(category), format!("Category {category}"), ""),
        )
    }

    fn controller(api: MockCatalogApi) -> CatalogController {
        controller_with_cache(api, ResponseCache::default())
    }

    fn controller_with_cache(api: MockCatalogApi, cache: ResponseCache) -> CatalogController {
        let fetcher = CatalogFetcher::new(Arc::new(api), cache, RetryPolicy::none());
        CatalogController::new(Arc::new(CatalogStore::empty()), fetcher)
    }

    #[tokio::test]
    async fn load_products_populates_and_settles() {
        let mut api = MockCatalogApi::new();
        api.expect_list_products()
            .returning(|| Ok(vec![product(1, "Red Shoe", 1), product(2, "Blue Hat", 1)]));
        let catalog = controller(api);

        catalog.load_products().await.unwrap();

        let state = catalog.state();
        assert_eq!(state.products.len(), 2);
        assert_eq!(state.filtered_products, state.products);
        assert!(!state.is_loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn load_failure_sets_error_and_clears_loading() {
        let mut api = MockCatalogApi::new();
        api.expect_list_products()
            .returning(|| Err(FetchError::status(Resource::Products, 500)));
        let catalog = controller(api);

        assert!(catalog.load_products().await.is_err());

        let state = catalog.state();
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some(LOAD_PRODUCTS_FAILED));
    }

    #[tokio::test]
    async fn search_filters_locally_without_network() {
        let mut api = MockCatalogApi::new();
        api.expect_list_products()
            .times(1)
            .returning(|| Ok(vec![product(1, "Red Shoe", 1), product(2, "Blue Hat", 1)]));
        let catalog = controller(api);
        catalog.load_products().await.unwrap();

        catalog.search("red");
        let state = catalog.state();
        assert_eq!(state.search_query, "red");
        assert_eq!(state.filtered_products, vec![product(1, "Red Shoe", 1)]);

        catalog.clear_search();
        assert_eq!(catalog.state().filtered_products.len(), 2);
    }

    #[tokio::test]
    async fn select_category_failure_keeps_selection() {
        let mut api = MockCatalogApi::new();
        api.expect_list_products_by_category()
            .returning(|id| Err(FetchError::transport(Resource::CategoryProducts(id), "refused")));
        let catalog = controller(api);

        assert!(catalog.select_category(CategoryId(3)).await.is_err());

        let state = catalog.state();
        assert_eq!(state.selected_category, None);
        assert_eq!(state.error.as_deref(), Some(LOAD_CATEGORY_FAILED));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn clear_category_restores_search_view() {
        let mut api = MockCatalogApi::new();
        api.expect_list_products()
            .returning(|| Ok(vec![product(1, "Red Shoe", 1), product(2, "Red Hat", 2)]));
        api.expect_list_products_by_category()
            .returning(|_| Ok(vec![product(9, "Elsewhere", 5)]));
        let catalog = controller(api);
        catalog.load_products().await.unwrap();
        catalog.search("shoe");

        catalog.select_category(CategoryId(5)).await.unwrap();
        assert_eq!(catalog.state().filtered_products[0].id, ProductId(9));

        catalog.clear_category();
        let state = catalog.state();
        assert_eq!(state.selected_category, None);
        assert_eq!(state.filtered_products, vec![product(1, "Red Shoe", 1)]);
    }

    #[tokio::test]
    async fn stale_products_are_revalidated_in_background() {
        let mut api = MockCatalogApi::new();
        let mut calls = 0u64;
        api.expect_list_products().times(3).returning(move || {
            calls += 1;
            Ok((1..=calls).map(|i| product(i, "Item", 1)).collect())
        });
        let cache = ResponseCache::new(16, Duration::ZERO, Duration::from_secs(60));
        let catalog = controller_with_cache(api, cache);

        // Miss: fetch once
        catalog.load_products().await.unwrap();
        assert_eq!(catalog.state().products.len(), 1);

        // Stale hit: dispatch cached list now, fresh one after revalidation
        catalog.load_products().await.unwrap();
        assert_eq!(catalog.state().products.len(), 1);
        assert!(!catalog.state().is_loading);

        catalog.settle().await;
        assert_eq!(catalog.state().products.len(), 2);

        // The revalidation refilled the cache; next stale hit serves it
        catalog.load_products().await.unwrap();
        catalog.settle().await;
        assert_eq!(catalog.state().products.len(), 3);
    }

    #[tokio::test]
    async fn product_detail_excludes_itself_and_caps_related() {
        let mut api = MockCatalogApi::new();
        api.expect_get_product()
            .returning(|id| Ok(product(id.0, "Main", 4)));
        api.expect_list_products_by_category()
            .returning(|_| Ok((1..=10).map(|i| product(i, "Sibling", 4)).collect()));
        let catalog = controller(api);

        let detail = catalog.product_detail(ProductId(3)).await.unwrap();

        assert_eq!(detail.product.id, ProductId(3));
        assert_eq!(detail.related.len(), RELATED_LIMIT);
        assert!(detail.related.iter().all(|p| p.id != ProductId(3)));
    }

    #[tokio::test]
    async fn product_detail_survives_related_failure() {
        let mut api = MockCatalogApi::new();
        api.expect_get_product()
            .returning(|id| Ok(product(id.0, "Main", 4)));
        api.expect_list_products_by_category()
            .returning(|id| Err(FetchError::status(Resource::CategoryProducts(id), 502)));
        let catalog = controller(api);

        let detail = catalog.product_detail(ProductId(3)).await.unwrap();
        assert!(detail.related.is_empty());
    }

    #[tokio::test]
    async fn empty_remote_search_is_local() {
        let mut api = MockCatalogApi::new();
        api.expect_search_products().never();
        let catalog = controller(api);

        catalog.search_remote("   ").await.unwrap();
        assert_eq!(catalog.state().search_query, "   ");
    }
}
