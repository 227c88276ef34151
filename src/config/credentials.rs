//! API key loading
//!
//! The key comes from a text file (first choice) or the `CSFLOAT_API_KEY`
//! environment variable, which may also be set through `.env`.

use std::path::Path;

use super::loader::ConfigError;

/// Environment variable consulted when the key file is missing or empty
pub const API_KEY_ENV: &str = "CSFLOAT_API_KEY";

/// Read the API key from `key_file`, falling back to `CSFLOAT_API_KEY`
pub fn read_api_key(key_file: &str) -> Result<String, ConfigError> {
    resolve_api_key(key_file, std::env::var(API_KEY_ENV).ok())
}

/// Resolve the API key from `key_file` or an already-read env value
pub fn resolve_api_key(key_file: &str, env_value: Option<String>) -> Result<String, ConfigError> {
    let expanded = shellexpand::tilde(key_file).to_string();

    if let Some(key) = read_key_file(Path::new(&expanded)) {
        return Ok(key);
    }

    env_value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingApiKey {
            key_file: expanded,
        })
}

fn read_key_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let key = content.trim();
            if key.is_empty() {
                tracing::warn!("API key file {} is empty", path.display());
                None
            } else {
                Some(key.to_string())
            }
        }
        Err(e) => {
            tracing::debug!("Could not read API key file {}: {}", path.display(), e);
            None
        }
    }
}
