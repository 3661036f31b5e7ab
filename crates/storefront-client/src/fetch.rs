//! Cached, retrying reads against the catalog service
//!
//! [`CatalogFetcher`] answers from the response cache when it can and goes
//! to the network (with retry) when it cannot. A stale answer is returned as
//! such; the caller decides whether to revalidate with one of the
//! `refresh_*` methods, which always hit the network and refill the cache.

use crate::api::CatalogApi;
use crate::cache::{Cached, Freshness, ResponseCache};
use crate::retry::RetryPolicy;
use std::future::Future;
use std::sync::Arc;
use storefront_core::{Category, CategoryId, FetchError, Product, ProductId, Resource};

/// Catalog reads through cache and retry
#[derive(Clone)]
pub struct CatalogFetcher {
    api: Arc<dyn CatalogApi>,
    cache: ResponseCache,
    retry: RetryPolicy,
}

impl CatalogFetcher {
    /// Create fetcher
    #[must_use]
    pub fn new(api: Arc<dyn CatalogApi>, cache: ResponseCache, retry: RetryPolicy) -> Self {
        Self { api, cache, retry }
    }

    /// Response cache backing this fetcher
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn cached<T, F, Fut>(&self, resource: Resource, load: F) -> Result<Cached<T>, FetchError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        if let Some(hit) = self.cache.get::<T>(&resource).await {
            tracing::debug!(%resource, stale = hit.is_stale(), "cache hit");
            return Ok(hit);
        }

        let value = self.refresh(resource, load).await?;
        Ok(Cached {
            value,
            freshness: Freshness::Fresh,
        })
    }

    async fn refresh<T, F, Fut>(&self, resource: Resource, load: F) -> Result<T, FetchError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        tracing::debug!(%resource, "fetching");
        let value = self.retry.run(&resource, load).await?;
        self.cache.insert(resource, value.clone()).await;
        Ok(value)
    }

    /// All products
    ///
    /// # Errors
    /// `FetchError` when nothing is cached and the network read fails.
    pub async fn products(&self) -> Result<Cached<Vec<Product>>, FetchError> {
        self.cached(Resource::Products, || self.api.list_products()).await
    }

    /// All products from the network
    ///
    /// # Errors
    /// `FetchError` when the network read fails after retries.
    pub async fn refresh_products(&self) -> Result<Vec<Product>, FetchError> {
        self.refresh(Resource::Products, || self.api.list_products()).await
    }

    /// One product
    ///
    /// # Errors
    /// `FetchError` when nothing is cached and the network read fails.
    pub async fn product(&self, id: ProductId) -> Result<Cached<Product>, FetchError> {
        self.cached(Resource::Product(id), || self.api.get_product(id)).await
    }

    /// All categories
    ///
    /// # Errors
    /// `FetchError` when nothing is cached and the network read fails.
    pub async fn categories(&self) -> Result<Cached<Vec<Category>>, FetchError> {
        self.cached(Resource::Categories, || self.api.list_categories()).await
    }

    /// All categories from the network
    ///
    /// # Errors
    /// `FetchError` when the network read fails after retries.
    pub async fn refresh_categories(&self) -> Result<Vec<Category>, FetchError> {
        self.refresh(Resource::Categories, || self.api.list_categories()).await
    }

    /// Products of one category
    ///
    /// # Errors
    /// `FetchError` when nothing is cached and the network read fails.
    pub async fn category_products(&self, id: CategoryId) -> Result<Cached<Vec<Product>>, FetchError> {
        self.cached(Resource::CategoryProducts(id), || {
            self.api.list_products_by_category(id)
        })
        .await
    }

    /// Products of one category from the network
    ///
    /// # Errors
    /// `FetchError` when the network read fails after retries.
    pub async fn refresh_category_products(&self, id: CategoryId) -> Result<Vec<Product>, FetchError> {
        self.refresh(Resource::CategoryProducts(id), || {
            self.api.list_products_by_category(id)
        })
        .await
    }

    /// Server-side title search
    ///
    /// # Errors
    /// `FetchError` when nothing is cached and the network read fails.
    pub async fn search(&self, query: &str) -> Result<Cached<Vec<Product>>, FetchError> {
        self.cached(Resource::Search(query.to_string()), || self.api.search_products(query)).await
    }
}

impl std::fmt::Debug for CatalogFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogFetcher")
            .field("cache", &self.cache)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
