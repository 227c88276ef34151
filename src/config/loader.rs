//! Configuration Loader
//!
//! Loads and validates configuration from TOML files. Every field has a
//! default, so an empty file (or no file at all) is a valid configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::csfloat::{CsFloatConfig, RetryPolicy, DEFAULT_API_BASE_URL, MAX_PAGE_LIMIT};
use crate::application::WatcherSettings;
use crate::domain::Thresholds;
use crate::ports::marketplace::SortKey;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub watcher: WatcherSection,
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub cache: CacheSection,
}

/// CSFloat API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// CSFloat API base URL
    pub base_url: String,
    /// Text file holding the API key (`~` is expanded)
    pub key_file: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Sleep between retries of network errors and rate limits
    pub retry_delay_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            key_file: "key.txt".to_string(),
            timeout_secs: 15,
            retry_delay_secs: 10,
        }
    }
}

/// Poll loop configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherSection {
    /// Seconds between the end of one cycle and the start of the next
    pub interval_secs: u64,
    /// Listings per cycle (1-50)
    pub limit: u32,
    pub sort: SortKey,
    /// Minimum ML discount percentage, <= 0 disables the check
    pub min_ml_discount: f64,
    /// Minimum trade discount percentage, <= 0 disables the check
    pub min_trade_discount: f64,
    /// Run a single cycle then exit
    pub once: bool,
}

impl Default for WatcherSection {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            limit: 50,
            sort: SortKey::MostRecent,
            min_ml_discount: 0.0,
            min_trade_discount: 0.0,
            once: false,
        }
    }
}

/// Sale history configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    /// Sales older than this many days are ignored
    pub days: u32,
    /// Max recent sales per item used for the median
    pub limit: usize,
    /// Concurrent history requests per cycle
    pub concurrency: usize,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            days: 7,
            limit: 40,
            concurrency: 1,
        }
    }
}

/// History cache configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            max_entries: 4096,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("No API key: {key_file} is missing or empty and CSFLOAT_API_KEY is not set")]
    MissingApiKey { key_file: String },
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.watcher.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "watcher.interval_secs must be > 0".to_string(),
            ));
        }

        if self.watcher.limit == 0 || self.watcher.limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "watcher.limit must be 1-{}, got {}",
                MAX_PAGE_LIMIT, self.watcher.limit
            )));
        }

        if self.watcher.min_ml_discount < 0.0 || self.watcher.min_ml_discount.is_nan() {
            return Err(ConfigError::ValidationError(format!(
                "watcher.min_ml_discount must be >= 0, got {}",
                self.watcher.min_ml_discount
            )));
        }

        if self.watcher.min_trade_discount < 0.0 || self.watcher.min_trade_discount.is_nan() {
            return Err(ConfigError::ValidationError(format!(
                "watcher.min_trade_discount must be >= 0, got {}",
                self.watcher.min_trade_discount
            )));
        }

        if self.history.days == 0 {
            return Err(ConfigError::ValidationError(
                "history.days must be > 0".to_string(),
            ));
        }

        if self.history.limit == 0 {
            return Err(ConfigError::ValidationError(
                "history.limit must be > 0".to_string(),
            ));
        }

        if self.history.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "history.concurrency must be > 0".to_string(),
            ));
        }

        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.ttl_secs must be > 0".to_string(),
            ));
        }

        if self.cache.max_entries == 0 {
            return Err(ConfigError::ValidationError(
                "cache.max_entries must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Unbounded fixed-delay retry, as configured
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::unbounded(Duration::from_secs(self.api.retry_delay_secs))
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.watcher.min_ml_discount, self.watcher.min_trade_discount)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

impl From<&Config> for CsFloatConfig {
    fn from(config: &Config) -> Self {
        CsFloatConfig {
            api_base_url: config.api.base_url.trim().to_string(),
            timeout: Duration::from_secs(config.api.timeout_secs),
            retry: config.retry_policy(),
        }
    }
}

impl From<&Config> for WatcherSettings {
    fn from(config: &Config) -> Self {
        WatcherSettings {
            interval: Duration::from_secs(config.watcher.interval_secs),
            limit: config.watcher.limit,
            sort: config.watcher.sort,
            once: config.watcher.once,
        }
    }
}
