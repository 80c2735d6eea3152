//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client behavior settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Vendor API endpoints and request headers
    #[serde(default)]
    pub api: ApiConfig,

    /// Text chunking settings for long product descriptions
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Deletion guard thresholds for reconciliation
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.max_concurrent == 0 {
            return Err(AppError::validation("http.max_concurrent must be > 0"));
        }
        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(AppError::validation("api.base_url is not a valid URL"));
        }
        if url::Url::parse(&self.api.shop_url).is_err() {
            return Err(AppError::validation("api.shop_url is not a valid URL"));
        }
        if self.chunking.chunk_size == 0 {
            return Err(AppError::validation("chunking.chunk_size must be > 0"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::validation(
                "chunking.chunk_overlap must be smaller than chunk_size",
            ));
        }
        if self.sync.max_drop_percent > 100 {
            return Err(AppError::validation("sync.max_drop_percent must be <= 100"));
        }
        Ok(())
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent requests during shop fan-out
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Vendor API endpoints and request headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the vendor cloud API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Base URL of the public shop site
    #[serde(default = "defaults::shop_url")]
    pub shop_url: String,

    /// `app-locale` header value and translations locale
    #[serde(default = "defaults::locale")]
    pub locale: String,

    /// `app-market` header value
    #[serde(default = "defaults::market")]
    pub market: String,

    /// ISO code of the documentation catalog to harvest
    #[serde(default = "defaults::catalog_iso")]
    pub catalog_iso: String,

    /// Environment variable holding the API key
    #[serde(default = "defaults::api_key_env")]
    pub api_key_env: String,
}

impl ApiConfig {
    /// Build a full API endpoint URL from a relative path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Build a full shop URL from a relative path.
    pub fn shop_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.shop_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            shop_url: defaults::shop_url(),
            locale: defaults::locale(),
            market: defaults::market(),
            catalog_iso: defaults::catalog_iso(),
            api_key_env: defaults::api_key_env(),
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in grapheme clusters
    #[serde(default = "defaults::chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks
    #[serde(default = "defaults::chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: defaults::chunk_size(),
            chunk_overlap: defaults::chunk_overlap(),
        }
    }
}

/// Deletion guard thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum allowed shrink percentage before deletions are deferred
    #[serde(default = "defaults::max_drop_percent")]
    pub max_drop_percent: u8,

    /// Minimum persisted count before the guard applies
    #[serde(default = "defaults::min_baseline")]
    pub min_baseline: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_drop_percent: defaults::max_drop_percent(),
            min_baseline: defaults::min_baseline(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; harvester/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }
    pub fn max_concurrent() -> usize {
        5
    }

    // API defaults
    pub fn base_url() -> String {
        "https://api.zephyrcloud.io".into()
    }
    pub fn shop_url() -> String {
        "https://shop.zephyrclimate.com".into()
    }
    pub fn locale() -> String {
        "es".into()
    }
    pub fn market() -> String {
        "eu".into()
    }
    pub fn catalog_iso() -> String {
        "KB_CLOUD".into()
    }
    pub fn api_key_env() -> String {
        "ZEPHYR_API_KEY".into()
    }

    // Chunking defaults
    pub fn chunk_size() -> usize {
        1000
    }
    pub fn chunk_overlap() -> usize {
        200
    }

    // Sync defaults
    pub fn max_drop_percent() -> u8 {
        20
    }
    pub fn min_baseline() -> usize {
        10
    }
}
