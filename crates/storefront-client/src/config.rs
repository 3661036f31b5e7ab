//! Client configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or no
//! file) is enough.
//!
//! ```toml
//! api_base_url = "https://api.escuelajs.co/api/v1"
//! request_timeout_secs = 15
//!
//! [cache]
//! capacity = 256
//! stale_after_secs = 300
//! ttl_secs = 1800
//!
//! [retry]
//! max_retries = 3
//! base_delay_ms = 1000
//! ```

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default catalog service
pub const DEFAULT_API_BASE_URL: &str = "https://api.escuelajs.co/api/v1";

/// Default identity provider userinfo endpoint
pub const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/userinfo/v2/me";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`ClientConfig`]
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values are individually valid but inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// HTTP client could not be constructed
    #[error("http client error: {0}")]
    HttpClient(String),
}

/// Response cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached responses
    pub capacity: u64,
    /// Age after which an entry is served stale and revalidated
    pub stale_after_secs: u64,
    /// Age after which an entry is evicted
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// Stale window as a duration
    #[inline]
    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// Eviction window as a duration
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            stale_after_secs: 5 * 60,
            ttl_secs: 30 * 60,
        }
    }
}

/// Storefront client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Catalog service base URL, without trailing slash
    pub api_base_url: String,
    /// Identity provider userinfo endpoint
    pub userinfo_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Response cache
    pub cache: CacheConfig,
    /// Retry policy for catalog reads
    pub retry: RetryPolicy,
    /// Directory holding the persisted session
    pub storage_dir: PathBuf,
}

impl ClientConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` if the text is not valid TOML for this struct
    /// - `ConfigError::Invalid` if validation fails
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - see [`ClientConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With catalog base URL
    #[inline]
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// With userinfo endpoint
    #[inline]
    #[must_use]
    pub fn with_userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = url.into();
        self
    }

    /// With cache settings
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With session storage directory
    #[inline]
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Per-request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check cross-field consistency
    ///
    /// # Errors
    /// - `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url is empty".to_string()));
        }
        if self.userinfo_url.trim().is_empty() {
            return Err(ConfigError::Invalid("userinfo_url is empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".to_string()));
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::Invalid("cache.capacity must be positive".to_string()));
        }
        if self.cache.stale_after_secs > self.cache.ttl_secs {
            return Err(ConfigError::Invalid(format!(
                "cache.stale_after_secs ({}) exceeds cache.ttl_secs ({})",
                self.cache.stale_after_secs, self.cache.ttl_secs
            )));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
            request_timeout_secs: 15,
            cache: CacheConfig::default(),
            retry: RetryPolicy::default(),
            storage_dir: PathBuf::from(".storefront"),
        }
    }
}
