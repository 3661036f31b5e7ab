//! Storefront Core - client-side session and catalog state
//!
//! Two independent stores, each a pure state machine driven by actions:
//! - [`SessionStore`]: unresolved / authenticating / signed-out / signed-in
//! - [`CatalogStore`]: products, filtered view, search and category
//!   selections, loading flag, error slot
//!
//! Neither store performs I/O. An orchestration layer fetches data, persists
//! the session and dispatches the outcomes.
//!
//! # Example
//!
//! ```rust
//! use storefront_core::prelude::*;
//!
//! let catalog = CatalogStore::empty();
//! catalog.apply(CatalogAction::SetLoading(true));
//! catalog.apply(CatalogAction::SetProducts(Vec::new()));
//! catalog.apply(CatalogAction::SetLoading(false));
//! assert!(!catalog.state().is_loading);
//!
//! let session = SessionStore::unresolved();
//! session.dispatch(SessionAction::Restored(None)).unwrap();
//! assert_eq!(session.phase(), SessionPhase::SignedOut);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod catalog;
pub mod error;
pub mod format;
pub mod session;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use catalog::{
    filter_by_title, related_products, CatalogAction, CatalogReducer, CatalogState, CatalogStore,
    RELATED_LIMIT,
};
pub use error::{
    FetchError, FetchErrorKind, ModelError, SessionError, SignInFailure, StorageError, StorageOp,
};
pub use session::{SessionAction, SessionPhase, SessionReducer, SessionState, SessionStore};
pub use store::{Reducer, Store};
pub use types::{
    Category, CategoryId, Product, ProductId, Resource, User, UserId, UserProfile,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the stores
    pub use crate::{
        CatalogAction, CatalogState, CatalogStore, Category, CategoryId, FetchError, Product,
        ProductId, Resource, SessionAction, SessionError, SessionPhase, SessionState,
        SessionStore, User, UserId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
