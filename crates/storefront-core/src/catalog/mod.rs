//! Product catalog state
//!
//! Holds the fetched collection, the view currently presented to the user,
//! and the search/category selections that produced it. All transitions are
//! plain field replacements; the filtered view is computed (or fetched) by
//! the caller and handed in ready-made.
//!
//! The filtered view is authoritative. It is usually a subsequence of
//! `products`, but a category-scoped server fetch replaces it with a set the
//! full collection may not contain.

mod filter;

pub use filter::{filter_by_title, related_products, RELATED_LIMIT};

use crate::store::{Reducer, Store};
use crate::types::{CategoryId, Product};
use std::collections::HashSet;
use std::convert::Infallible;

/// Catalog state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogState {
    /// Full collection in server order
    pub products: Vec<Product>,
    /// View presented to the user
    pub filtered_products: Vec<Product>,
    /// Raw search text
    pub search_query: String,
    /// Category the view is scoped to
    pub selected_category: Option<CategoryId>,
    /// A fetch is in flight
    pub is_loading: bool,
    /// Message from the last failed fetch
    pub error: Option<String>,
}

impl CatalogState {
    /// Check if every filtered product also appears in the full collection
    ///
    /// Holds after local filtering; may not hold after a category fetch.
    #[must_use]
    pub fn filtered_is_subset(&self) -> bool {
        let known: HashSet<_> = self.products.iter().map(|p| p.id).collect();
        self.filtered_products.iter().all(|p| known.contains(&p.id))
    }

    /// Check if the view is the full collection, with no search text or
    /// category selected
    #[inline]
    #[must_use]
    pub fn is_unscoped(&self) -> bool {
        self.selected_category.is_none() && self.search_query.trim().is_empty()
    }
}

/// Catalog actions
#[derive(Debug, Clone)]
pub enum CatalogAction {
    /// Replace the full collection and reset the view to it
    SetProducts(Vec<Product>),
    /// Replace only the view
    SetFilteredProducts(Vec<Product>),
    /// Record the raw search text
    SetSearchQuery(String),
    /// Record the active category
    SetSelectedCategory(Option<CategoryId>),
    /// Set the loading flag
    SetLoading(bool),
    /// Set or clear the error message
    SetError(Option<String>),
}

/// Catalog transition function
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogReducer;

impl Reducer for CatalogReducer {
    type State = CatalogState;
    type Action = CatalogAction;
    type Error = Infallible;

    fn reduce(state: &CatalogState, action: CatalogAction) -> Result<CatalogState, Infallible> {
        let mut next = state.clone();
        match action {
            CatalogAction::SetProducts(products) => {
                next.filtered_products.clone_from(&products);
                next.products = products;
            }
            CatalogAction::SetFilteredProducts(products) => next.filtered_products = products,
            CatalogAction::SetSearchQuery(query) => next.search_query = query,
            CatalogAction::SetSelectedCategory(category) => next.selected_category = category,
            CatalogAction::SetLoading(loading) => next.is_loading = loading,
            CatalogAction::SetError(error) => next.error = error,
        }
        Ok(next)
    }
}

/// Store holding the product catalog
pub type CatalogStore = Store<CatalogReducer>;

impl CatalogStore {
    /// Create empty catalog store
    #[must_use]
    pub fn empty() -> Self {
        Self::new(CatalogState::default())
    }
}
