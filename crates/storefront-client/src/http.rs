//! HTTP clients for the catalog service and the identity provider

use crate::api::{CatalogApi, ProfileApi};
use crate::config::{ClientConfig, ConfigError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use storefront_core::{
    Category, CategoryId, FetchError, Product, ProductId, Resource, UserProfile,
};

fn build_client(config: &ClientConfig) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Send request and decode a JSON body
async fn send_json<T: DeserializeOwned>(
    resource: &Resource,
    request: RequestBuilder,
) -> Result<T, FetchError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| FetchError::transport(resource.clone(), e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(%resource, status = status.as_u16(), "non-success response");
        return Err(FetchError::status(resource.clone(), status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::transport(resource.clone(), e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| FetchError::decode(resource.clone(), e.to_string()))
}

fn check_products(resource: &Resource, products: &[Product]) -> Result<(), FetchError> {
    for product in products {
        product
            .validate()
            .map_err(|e| FetchError::invalid(resource.clone(), e.to_string()))?;
    }
    Ok(())
}

/// Catalog service client
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: Client,
    base_url: String,
}

impl HttpCatalogClient {
    /// Create client from configuration
    ///
    /// # Errors
    /// - `ConfigError::HttpClient` if the TLS backend cannot be initialised
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http: build_client(config)?,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are made against
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(format!("{}{}", self.base_url, path))
    }

    async fn fetch_products(
        &self,
        resource: Resource,
        request: RequestBuilder,
    ) -> Result<Vec<Product>, FetchError> {
        let products: Vec<Product> = send_json(&resource, request).await?;
        check_products(&resource, &products)?;
        tracing::debug!(%resource, count = products.len(), "fetched products");
        Ok(products)
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn list_products(&self) -> Result<Vec<Product>, FetchError> {
        self.fetch_products(Resource::Products, self.get("/products")).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, FetchError> {
        let resource = Resource::Product(id);
        let product: Product = send_json(&resource, self.get(&format!("/products/{id}"))).await?;
        check_products(&resource, std::slice::from_ref(&product))?;
        Ok(product)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, FetchError> {
        send_json(&Resource::Categories, self.get("/categories")).await
    }

    async fn list_products_by_category(&self, id: CategoryId) -> Result<Vec<Product>, FetchError> {
        self.fetch_products(
            Resource::CategoryProducts(id),
            self.get(&format!("/categories/{id}/products")),
        )
        .await
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, FetchError> {
        let request = self.get("/products/").query(&[("title", query)]);
        self.fetch_products(Resource::Search(query.to_string()), request).await
    }
}

/// Identity provider userinfo client
#[derive(Debug, Clone)]
pub struct HttpProfileClient {
    http: Client,
    userinfo_url: String,
}

impl HttpProfileClient {
    /// Create client from configuration
    ///
    /// # Errors
    /// - `ConfigError::HttpClient` if the TLS backend cannot be initialised
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http: build_client(config)?,
            userinfo_url: config.userinfo_url.clone(),
        })
    }
}

#[async_trait]
impl ProfileApi for HttpProfileClient {
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, FetchError> {
        let request = self.http.get(&self.userinfo_url).bearer_auth(token);
        send_json(&Resource::UserProfile, request).await
    }
}
