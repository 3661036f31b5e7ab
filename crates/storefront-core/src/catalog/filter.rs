//! Client-side product filtering

use crate::types::{Product, ProductId};

/// Maximum related products shown next to a product
pub const RELATED_LIMIT: usize = 6;

/// Products whose title contains `query`, ignoring case
///
/// Order-preserving, no ranking. A query that is empty after trimming
/// returns the whole collection; otherwise the untrimmed query is matched.
#[must_use]
pub fn filter_by_title(products: &[Product], query: &str) -> Vec<Product> {
    if query.trim().is_empty() {
        return products.to_vec();
    }

    let needle = query.to_lowercase();
    products
        .iter()
        .filter(|product| product.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Related products for a detail view
///
/// Drops the product itself from a same-category listing and keeps at most
/// `limit` entries in server order.
#[must_use]
pub fn related_products(category_products: &[Product], current: ProductId, limit: usize) -> Vec<Product> {
    category_products
        .iter()
        .filter(|product| product.id != current)
        .take(limit)
        .cloned()
        .collect()
}
