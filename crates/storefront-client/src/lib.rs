//! Storefront Client - fetch orchestration for the storefront stores
//!
//! Connects the pure stores in `storefront_core` to the outside world:
//! - Catalog service over HTTP, behind a response cache with a freshness
//!   window and a retry policy
//! - Identity provider userinfo lookup for sign-in
//! - Durable session storage (file or memory backed)
//! - Controllers that perform I/O and dispatch the outcomes
//!
//! # Example
//!
//! ```rust,no_run
//! use storefront_client::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storefront = Storefront::from_config(ClientConfig::default())?;
//!
//! storefront.session().restore_session().await?;
//! storefront.catalog().load_products().await?;
//! storefront.catalog().search("shirt");
//!
//! for product in &storefront.catalog().state().filtered_products {
//!     println!("{} {}", product.id, product.title);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod retry;
pub mod session;
pub mod storage;
pub mod storefront;

// Re-exports for convenience
pub use api::{CatalogApi, ProfileApi};
pub use cache::{CacheStats, Cached, Freshness, ResponseCache};
pub use catalog::{
    CatalogController, ProductDetail, LOAD_CATEGORY_FAILED, LOAD_PRODUCTS_FAILED, SEARCH_FAILED,
};
pub use config::{CacheConfig, ClientConfig, ConfigError};
pub use error::{StorefrontError, StorefrontResult};
pub use fetch::CatalogFetcher;
pub use http::{HttpCatalogClient, HttpProfileClient};
pub use retry::RetryPolicy;
pub use session::SessionController;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, SessionVault, SESSION_KEY};
pub use storefront::Storefront;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a storefront client
    pub use crate::{
        CatalogController, ClientConfig, ProductDetail, SessionController, Storefront,
        StorefrontError, StorefrontResult,
    };
    pub use storefront_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
