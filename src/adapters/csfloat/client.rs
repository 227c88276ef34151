//! CSFloat API Client
//!
//! Retrying JSON client shared by the listing and history endpoints.
//! Attaches the API key to every request and handles rate limiting.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use crate::ports::marketplace::ClientError;
use crate::ports::transport::{HttpRequest, HttpTransport};

/// Default CSFloat API root
pub const DEFAULT_API_BASE_URL: &str = "https://csfloat.com/api/v1";

/// How much of an error body ends up in the log
const ERROR_BODY_PREFIX_CHARS: usize = 120;

/// CSFloat API client configuration
#[derive(Debug, Clone)]
pub struct CsFloatConfig {
    /// Base URL for the CSFloat API
    pub api_base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retry policy for network errors and rate limits
    pub retry: RetryPolicy,
}

impl Default for CsFloatConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
        }
    }
}

/// JSON client with fixed-delay retry on network errors, 429 and 503.
///
/// Any other non-200 answer is logged and reported as `Ok(None)`.
#[derive(Clone)]
pub struct RetryingClient {
    transport: Arc<dyn HttpTransport>,
    api_key: String,
    policy: RetryPolicy,
}

// Keeps the API key out of debug output
impl fmt::Debug for RetryingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingClient")
            .field("policy", &self.policy)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl RetryingClient {
    pub fn new(transport: Arc<dyn HttpTransport>, api_key: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            policy,
        }
    }

    /// Send a request and decode the JSON body of a 200 answer.
    ///
    /// Returns `Ok(None)` for non-retryable error statuses. A 200 with a body
    /// that is not valid JSON is `ClientError::Decode` and is not retried.
    pub async fn request(&self, request: HttpRequest) -> Result<Option<Value>, ClientError> {
        let request = request.with_header("Authorization", self.api_key.clone());
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let failure = match self.transport.send(&request).await {
                Ok(response) if response.status == 200 => {
                    if attempts > 1 {
                        debug!("{} {} succeeded after {} attempts", request.method.as_str(), request.url, attempts);
                    }
                    return serde_json::from_str(&response.body)
                        .map(Some)
                        .map_err(|source| ClientError::Decode {
                            url: request.url.clone(),
                            source,
                        });
                }
                Ok(response) if RetryPolicy::is_retryable_status(response.status) => {
                    warn!(
                        "Rate limited: {} => {}; sleeping {:?}",
                        request.url, response.status, self.policy.delay
                    );
                    format!("HTTP {}", response.status)
                }
                Ok(response) => {
                    warn!(
                        "HTTP {} for {}: {}",
                        response.status,
                        request.url,
                        body_prefix(&response.body)
                    );
                    return Ok(None);
                }
                Err(e) => {
                    warn!("Network error for {}: {}; retrying in {:?}", request.url, e, self.policy.delay);
                    e.to_string()
                }
            };

            if !self.policy.should_retry(attempts) {
                warn!("Giving up on {} after {} attempts", request.url, attempts);
                return Err(ClientError::RetriesExhausted {
                    url: request.url.clone(),
                    attempts,
                    last_error: failure,
                });
            }

            tokio::time::sleep(self.policy.delay).await;
        }
    }

    /// GET `url` with the given query parameters
    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Option<Value>, ClientError> {
        let request = query
            .iter()
            .fold(HttpRequest::get(url), |req, (key, value)| req.with_query(key, value));
        self.request(request).await
    }
}

fn body_prefix(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREFIX_CHARS).collect()
}
