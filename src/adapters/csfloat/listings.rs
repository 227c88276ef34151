use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::client::RetryingClient;
use crate::domain::Listing;
use crate::ports::marketplace::{ClientError, ListingFeed, SortKey};
use crate::ports::transport::HttpRequest;

/// Listings cheaper than this (in cents) are never requested
pub const MIN_PRICE_CENTS: i64 = 100;

/// CSFloat has a hard cap on page size
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Buy-now listing feed backed by `GET /listings`
#[derive(Debug, Clone)]
pub struct CsFloatListings {
    client: RetryingClient,
    listings_url: String,
}

impl CsFloatListings {
    pub fn new(client: RetryingClient, api_base_url: &str) -> Self {
        Self {
            client,
            listings_url: format!("{}/listings", api_base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ListingFeed for CsFloatListings {
    async fn fetch_listings(&self, sort: SortKey, limit: u32) -> Result<Vec<Listing>, ClientError> {
        let request = HttpRequest::get(&self.listings_url)
            .with_query("limit", limit)
            .with_query("page", 0)
            .with_query("sort_by", sort.as_str())
            .with_query("min_price", MIN_PRICE_CENTS)
            .with_query("type", "buy_now");

        match self.client.request(request).await? {
            Some(body) => Ok(parse_listing_page(&body)),
            None => Ok(Vec::new()),
        }
    }
}

/// Extract listings from a `{ "data": [...] }` page.
///
/// A missing or null `data` field is an empty page. Entries that do not
/// match the listing shape are skipped.
pub fn parse_listing_page(body: &Value) -> Vec<Listing> {
    let Some(entries) = body.get("data").and_then(Value::as_array) else {
        debug!("Listing page has no data array");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<Listing>(entry.clone()) {
            Ok(listing) => Some(listing),
            Err(e) => {
                let id = entry.get("id").and_then(Value::as_str).unwrap_or("?");
                warn!("Skipping malformed listing {}: {}", id, e);
                None
            }
        })
        .collect()
}
