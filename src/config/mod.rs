//! Configuration Module
//!
//! Loads and validates configuration from TOML files and resolves the API key.

pub mod credentials;
pub mod loader;

pub use credentials::{read_api_key, resolve_api_key, API_KEY_ENV};
pub use loader::{
    ApiSection, CacheSection, Config, ConfigError, HistorySection, WatcherSection, load_config,
};
