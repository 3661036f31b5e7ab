//! Top-level wiring of stores, services and controllers

use crate::api::{CatalogApi, ProfileApi};
use crate::cache::ResponseCache;
use crate::catalog::CatalogController;
use crate::config::ClientConfig;
use crate::error::StorefrontResult;
use crate::fetch::CatalogFetcher;
use crate::http::{HttpCatalogClient, HttpProfileClient};
use crate::session::SessionController;
use crate::storage::{FileStorage, KeyValueStorage, SessionVault};
use std::sync::Arc;
use storefront_core::{CatalogStore, SessionStore};

/// A fully wired storefront client
///
/// Owns one session store and one catalog store, each behind its
/// controller.
#[derive(Debug)]
pub struct Storefront {
    config: ClientConfig,
    catalog: CatalogController,
    session: SessionController,
}

impl Storefront {
    /// Wire the client from explicit collaborators
    #[must_use]
    pub fn new(
        config: ClientConfig,
        catalog_api: Arc<dyn CatalogApi>,
        profiles: Arc<dyn ProfileApi>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let fetcher = CatalogFetcher::new(
            catalog_api,
            ResponseCache::from_config(&config.cache),
            config.retry,
        );
        let catalog = CatalogController::new(Arc::new(CatalogStore::empty()), fetcher);
        let session = SessionController::new(
            Arc::new(SessionStore::unresolved()),
            SessionVault::new(storage),
            profiles,
        );

        Self {
            config,
            catalog,
            session,
        }
    }

    /// Wire the client against the configured HTTP services and file storage
    ///
    /// # Errors
    /// `StorefrontError::Config` if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn from_config(config: ClientConfig) -> StorefrontResult<Self> {
        config.validate()?;
        let catalog_api = Arc::new(HttpCatalogClient::new(&config)?);
        let profiles = Arc::new(HttpProfileClient::new(&config)?);
        let storage = Arc::new(FileStorage::new(config.storage_dir.clone()));

        tracing::debug!(base_url = %config.api_base_url, "storefront client configured");
        Ok(Self::new(config, catalog_api, profiles, storage))
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Catalog controller
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &CatalogController {
        &self.catalog
    }

    /// Session controller
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionController {
        &self.session
    }
}
