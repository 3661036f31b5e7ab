//! Testing utilities for the storefront workspace
//!
//! Shared fixtures and in-memory fakes for the service seams.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use storefront_client::{CatalogApi, KeyValueStorage, MemoryStorage, ProfileApi};
use storefront_core::{
    Category, CategoryId, FetchError, Product, ProductId, Resource, StorageError, StorageOp, User,
    UserId, UserProfile,
};

pub fn category(id: u64, name: &str) -> Category {
    Category::new(CategoryId(id), name, format!("https://img.example/c{id}.png"))
}

pub fn product(id: u64, title: &str, price: i64, category_id: u64) -> Product {
    Product::new(
        ProductId(id),
        title,
        Decimal::from(price),
        category(category_id, &format!("Category {category_id}")),
    )
    .with_images(vec![format!("https://img.example/p{id}.png")])
}

pub fn user(id: u64) -> User {
    User::new(UserId(u128::from(id)), format!("user{id}@example.com"), format!("User {id}"))
}

pub fn profile(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: format!("Profile {id}"),
        picture: Some(format!("https://img.example/u{id}.png")),
    }
}

/// A small catalog spread over two categories
pub fn sample_catalog() -> (Vec<Product>, Vec<Category>) {
    let products = vec![
        product(1, "Red Shoe", 30, 1),
        product(2, "Blue Hat", 12, 2),
        product(3, "Red Scarf", 18, 2),
        product(4, "Green Shoe", 45, 1),
    ];
    let categories = vec![category(1, "Category 1"), category(2, "Category 2")];
    (products, categories)
}

/// Catalog service fake answering from in-memory lists
///
/// Every request is logged by resource. Failures can be switched on for
/// all requests or for the next `n`.
#[derive(Debug, Default)]
pub struct ScriptedCatalog {
    products: Mutex<Vec<Product>>,
    categories: Mutex<Vec<Category>>,
    requests: Mutex<Vec<Resource>>,
    fail_status: Mutex<Option<u16>>,
    transient_failures: Mutex<u32>,
}

impl ScriptedCatalog {
    pub fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
        Self {
            products: Mutex::new(products),
            categories: Mutex::new(categories),
            ..Self::default()
        }
    }

    pub fn sample() -> Self {
        let (products, categories) = sample_catalog();
        Self::new(products, categories)
    }

    /// Replace the served products
    pub fn set_products(&self, products: Vec<Product>) {
        *self.products.lock() = products;
    }

    /// Answer every request with `status` (or stop failing with `None`)
    pub fn fail_with_status(&self, status: Option<u16>) {
        *self.fail_status.lock() = status;
    }

    /// Answer the next `n` requests with 503
    pub fn fail_next(&self, n: u32) {
        *self.transient_failures.lock() = n;
    }

    /// Requests made for `resource`
    pub fn calls(&self, resource: &Resource) -> usize {
        self.requests.lock().iter().filter(|r| *r == resource).count()
    }

    /// Requests made in total
    pub fn total_calls(&self) -> usize {
        self.requests.lock().len()
    }

    fn record(&self, resource: Resource) -> Result<(), FetchError> {
        self.requests.lock().push(resource.clone());

        if let Some(status) = *self.fail_status.lock() {
            return Err(FetchError::status(resource, status));
        }
        let mut transient = self.transient_failures.lock();
        if *transient > 0 {
            *transient -= 1;
            return Err(FetchError::status(resource, 503));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for ScriptedCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, FetchError> {
        self.record(Resource::Products)?;
        Ok(self.products.lock().clone())
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, FetchError> {
        self.record(Resource::Product(id))?;
        self.products
            .lock()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| FetchError::status(Resource::Product(id), 404))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, FetchError> {
        self.record(Resource::Categories)?;
        Ok(self.categories.lock().clone())
    }

    async fn list_products_by_category(&self, id: CategoryId) -> Result<Vec<Product>, FetchError> {
        self.record(Resource::CategoryProducts(id))?;
        Ok(self
            .products
            .lock()
            .iter()
            .filter(|p| p.category.id == id)
            .cloned()
            .collect())
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, FetchError> {
        self.record(Resource::Search(query.to_string()))?;
        let needle = query.to_lowercase();
        Ok(self
            .products
            .lock()
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

/// Identity provider fake
///
/// Tokens listed with [`ScriptedProfiles::with_token`] resolve to their
/// profile; any other token is rejected with 401.
#[derive(Debug, Default)]
pub struct ScriptedProfiles {
    tokens: Mutex<Vec<(String, UserProfile)>>,
    calls: Mutex<usize>,
}

impl ScriptedProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(self, token: &str, profile: UserProfile) -> Self {
        self.tokens.lock().push((token.to_string(), profile));
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ProfileApi for ScriptedProfiles {
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, FetchError> {
        *self.calls.lock() += 1;
        self.tokens
            .lock()
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, profile)| profile.clone())
            .ok_or_else(|| FetchError::status(Resource::UserProfile, 401))
    }
}

/// Storage whose operations can be made to fail
#[derive(Debug, Clone, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    failing: Arc<Mutex<Vec<StorageOp>>>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `op` fail from now on
    pub fn fail(&self, op: StorageOp) {
        self.failing.lock().push(op);
    }

    /// Underlying records
    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    fn check(&self, op: StorageOp, key: &str) -> Result<(), StorageError> {
        if self.failing.lock().contains(&op) {
            return Err(StorageError::io(
                op,
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "injected failure"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for FlakyStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check(StorageOp::Read, key)?;
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check(StorageOp::Write, key)?;
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.check(StorageOp::Delete, key)?;
        self.inner.delete(key).await
    }
}
