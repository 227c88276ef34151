use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::{ItemKey, Listing, SaleRecord};

/// Errors surfaced by marketplace calls.
///
/// Transient failures are retried inside the client and only show up here
/// when a bounded retry policy runs out.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Gave up on {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Listing feed sort order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    #[value(name = "most_recent")]
    MostRecent,
    #[value(name = "highest_discount")]
    HighestDiscount,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::MostRecent => "most_recent",
            SortKey::HighestDiscount => "highest_discount",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the current page of buy-now listings
#[async_trait]
pub trait ListingFeed: Send + Sync {
    /// Fetch up to `limit` listings. Non-200 answers yield an empty page.
    async fn fetch_listings(&self, sort: SortKey, limit: u32) -> Result<Vec<Listing>, ClientError>;
}

/// Source of an item's completed sales, in upstream order
#[async_trait]
pub trait SaleHistorySource: Send + Sync {
    /// Fetch sale history for one item. "No data" is an empty vector.
    async fn fetch_sales(&self, key: &ItemKey) -> Result<Vec<SaleRecord>, ClientError>;
}
