use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::client::RetryingClient;
use crate::domain::{ItemKey, SaleRecord};
use crate::ports::marketplace::{ClientError, SaleHistorySource};

/// Everything except ASCII alphanumerics and `-._~` is escaped in the item name
const ITEM_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Sale history source backed by `GET /history/{name}/sales?paint_index=N`
#[derive(Debug, Clone)]
pub struct CsFloatHistory {
    client: RetryingClient,
    base_url: Url,
}

impl CsFloatHistory {
    pub fn new(client: RetryingClient, api_base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(api_base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", api_base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(api_base_url.to_string()));
        }

        Ok(Self { client, base_url })
    }

    /// Build the history URL; the item name is percent-encoded as one path segment
    pub fn history_url(&self, key: &ItemKey) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}/history/{}/sales",
            self.base_url.path().trim_end_matches('/'),
            utf8_percent_encode(&key.name, ITEM_NAME)
        );
        url.set_path(&path);
        url.set_query(Some(&format!("paint_index={}", key.paint_index)));
        url
    }
}

#[async_trait]
impl SaleHistorySource for CsFloatHistory {
    async fn fetch_sales(&self, key: &ItemKey) -> Result<Vec<SaleRecord>, ClientError> {
        let url = self.history_url(key);

        let sales = match self.client.get(url.as_str(), &[]).await? {
            Some(body) => parse_sales(&body),
            None => Vec::new(),
        };

        debug!("History for {}: {} sales", key, sales.len());
        Ok(sales)
    }
}

#[derive(Debug, Deserialize)]
struct RawSale {
    #[serde(default)]
    unit_price: Option<i64>,
    #[serde(default)]
    price: Option<i64>,
    created_at: DateTime<Utc>,
}

/// Parse a sale history body, preserving upstream order.
///
/// Anything other than a JSON array means "no data". Entries without a price
/// or timestamp are dropped.
pub fn parse_sales(body: &Value) -> Vec<SaleRecord> {
    let Some(entries) = body.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let raw: RawSale = serde_json::from_value(entry.clone()).ok()?;
            let price = raw.unit_price.or(raw.price)?;
            Some(SaleRecord::new(price, raw.created_at))
        })
        .collect()
}
