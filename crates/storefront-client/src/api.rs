//! Remote service seams
//!
//! The controllers only see these traits. [`crate::http`] implements them
//! over HTTP; tests substitute mocks or scripted fakes.

use async_trait::async_trait;
use storefront_core::{Category, CategoryId, FetchError, Product, ProductId, UserProfile};

/// Read-only catalog service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// All products, in server order
    async fn list_products(&self) -> Result<Vec<Product>, FetchError>;

    /// One product
    async fn get_product(&self, id: ProductId) -> Result<Product, FetchError>;

    /// All categories
    async fn list_categories(&self) -> Result<Vec<Category>, FetchError>;

    /// Products of one category
    async fn list_products_by_category(&self, id: CategoryId) -> Result<Vec<Product>, FetchError>;

    /// Server-side title search
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, FetchError>;
}

/// Identity provider userinfo lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// Fetch the profile the bearer token belongs to
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, FetchError>;
}
