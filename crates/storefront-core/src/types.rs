//! Core types for the storefront
//!
//! Defines the data received from the catalog service and the identity
//! provider:
//! - Products and the categories they embed
//! - Signed-in users and the profile they are built from
//! - Resource identities used for fetch errors and cache keys

use crate::error::ModelError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Product identifier assigned by the catalog service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category identifier assigned by the catalog service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local user identifier
///
/// Wide enough for identity provider account numbers, which run past
/// `u64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u128);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category ID
    pub id: CategoryId,
    /// Display name
    pub name: String,
    /// Image URI
    pub image: String,
    /// Server creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_at: Option<DateTime<Utc>>,
    /// Server update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    /// Create category without server timestamps
    #[inline]
    #[must_use]
    pub fn new(id: CategoryId, name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image: image.into(),
            creation_at: None,
            updated_at: None,
        }
    }
}

/// Catalog product
///
/// Immutable once received; a refetch replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID
    pub id: ProductId,
    /// Title shown in listings and matched by search
    pub title: String,
    /// Unit price, never negative
    pub price: Decimal,
    /// Long description
    pub description: String,
    /// Owning category, embedded by value
    pub category: Category,
    /// Image URIs in display order
    #[serde(default)]
    pub images: Vec<String>,
    /// Server creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_at: Option<DateTime<Utc>>,
    /// Server update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Create product with no images and no server timestamps
    #[must_use]
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        price: Decimal,
        category: Category,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            description: String::new(),
            category,
            images: Vec::new(),
            creation_at: None,
            updated_at: None,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With image URIs
    #[inline]
    #[must_use]
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Check the invariants the catalog service is trusted to uphold
    ///
    /// # Errors
    /// - `ModelError::NegativePrice` if the price is below zero
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.price < Decimal::ZERO {
            return Err(ModelError::NegativePrice {
                id: self.id,
                price: self.price,
            });
        }
        Ok(())
    }
}

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Role granted by the backend, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    /// Create user without avatar or role
    #[inline]
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
            avatar: None,
            role: None,
        }
    }

    /// With avatar
    #[inline]
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Profile returned by the identity provider's userinfo endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider-side account ID (opaque string)
    pub id: String,
    /// Email address
    pub email: String,
    /// Full name
    pub name: String,
    /// Profile picture URI
    #[serde(default)]
    pub picture: Option<String>,
}

/// Upper bound (exclusive) of IDs assigned to profiles without a numeric ID
pub const FALLBACK_USER_ID_RANGE: u128 = 1000;

impl UserProfile {
    /// Numeric prefix of the provider ID
    ///
    /// Leading digits are read up to the first non-digit and saturate at
    /// `u128::MAX`. `None` when there are no leading digits or they are
    /// all zero.
    #[must_use]
    pub fn numeric_id(&self) -> Option<u128> {
        let raw = self.id.trim_start();
        let raw = raw.strip_prefix('+').unwrap_or(raw);
        let end = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
        let digits = &raw[..end];
        if digits.is_empty() {
            return None;
        }

        let id = digits.parse::<u128>().unwrap_or(u128::MAX);
        (id != 0).then_some(id)
    }

    /// Build the local user record
    ///
    /// Uses [`UserProfile::numeric_id`]; a profile without one gets a random
    /// ID below [`FALLBACK_USER_ID_RANGE`].
    #[must_use]
    pub fn into_user(self) -> User {
        let id = self
            .numeric_id()
            .unwrap_or_else(|| rand::random_range(0..FALLBACK_USER_ID_RANGE));

        User {
            id: UserId(id),
            email: self.email,
            name: self.name,
            avatar: self.picture,
            role: None,
        }
    }
}

/// Identity of a remote resource
///
/// Names what a fetch was for; doubles as the response cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// All products
    Products,
    /// One product
    Product(ProductId),
    /// All categories
    Categories,
    /// Products of one category
    CategoryProducts(CategoryId),
    /// Server-side title search
    Search(String),
    /// Identity provider profile
    UserProfile,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Products => write!(f, "products"),
            Self::Product(id) => write!(f, "product {id}"),
            Self::Categories => write!(f, "categories"),
            Self::CategoryProducts(id) => write!(f, "products of category {id}"),
            Self::Search(query) => write!(f, "search '{query}'"),
            Self::UserProfile => write!(f, "user profile"),
        }
    }
}
