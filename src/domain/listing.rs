//! Listing and Sale Types
//!
//! Marketplace listings as returned by the listing feed, the sale records
//! that make up an item's trade history, and the key tying the two together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A buy-now listing from the marketplace feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Listing id (used to build the item link)
    pub id: String,
    /// Asking price in cents
    pub price: i64,
    /// When the listing was created
    pub created_at: DateTime<Utc>,
    pub item: ListedItem,
    /// Price-model reference data, missing for some items
    #[serde(default)]
    pub reference: Option<PriceReference>,
}

/// Item details embedded in a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedItem {
    pub market_hash_name: String,
    /// Paint (skin) index; absent or 0 for vanilla items
    #[serde(default)]
    pub paint_index: Option<i64>,
}

/// Reference pricing attached to a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceReference {
    /// Model-predicted price in cents
    #[serde(default)]
    pub predicted_price: Option<i64>,
}

impl Listing {
    /// Key used to look up this listing's sale history.
    ///
    /// Returns `None` when the item has no usable paint index, since history
    /// can only be queried per variant.
    pub fn item_key(&self) -> Option<ItemKey> {
        match self.item.paint_index {
            Some(idx) if idx != 0 => Some(ItemKey::new(&self.item.market_hash_name, idx)),
            _ => None,
        }
    }

    /// Predicted price in cents, if the listing carries a usable one
    pub fn predicted_price(&self) -> Option<i64> {
        self.reference
            .as_ref()
            .and_then(|r| r.predicted_price)
            .filter(|&p| p != 0)
    }

    pub fn name(&self) -> &str {
        &self.item.market_hash_name
    }
}

/// One completed sale from an item's trade history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// Price paid in cents
    pub unit_price: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleRecord {
    pub fn new(unit_price: i64, created_at: DateTime<Utc>) -> Self {
        Self { unit_price, created_at }
    }
}

/// Identity of one fungible item line: market name plus paint index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub name: String,
    pub paint_index: i64,
}

impl ItemKey {
    pub fn new(name: impl Into<String>, paint_index: i64) -> Self {
        Self {
            name: name.into(),
            paint_index,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.name, self.paint_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_JSON: &str = r#"{
        "id": "812345678901234567",
        "price": 4500,
        "created_at": "2026-10-15T12:30:00.123456Z",
        "item": {
            "market_hash_name": "AK-47 | Redline (Field-Tested)",
            "paint_index": 282,
            "float_value": 0.2134
        },
        "reference": {
            "base_price": 5012,
            "predicted_price": 5400
        }
    }"#;

    #[test]
    fn test_listing_deserializes_csfloat_shape() {
        let listing: Listing = serde_json::from_str(LISTING_JSON).unwrap();

        assert_eq!(listing.id, "812345678901234567");
        assert_eq!(listing.price, 4500);
        assert_eq!(listing.name(), "AK-47 | Redline (Field-Tested)");
        assert_eq!(listing.predicted_price(), Some(5400));
        assert_eq!(
            listing.item_key(),
            Some(ItemKey::new("AK-47 | Redline (Field-Tested)", 282))
        );
    }

    #[test]
    fn test_listing_without_reference_or_paint() {
        let json = r#"{
            "id": "1",
            "price": 150,
            "created_at": "2026-10-15T12:30:00Z",
            "item": { "market_hash_name": "Sticker | Crown (Foil)" }
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();

        assert!(listing.reference.is_none());
        assert!(listing.predicted_price().is_none());
        assert!(listing.item_key().is_none());
    }

    #[test]
    fn test_zero_paint_index_is_not_keyable() {
        let mut listing: Listing = serde_json::from_str(LISTING_JSON).unwrap();
        listing.item.paint_index = Some(0);
        assert!(listing.item_key().is_none());
    }

    #[test]
    fn test_zero_predicted_price_is_ignored() {
        let mut listing: Listing = serde_json::from_str(LISTING_JSON).unwrap();
        listing.reference = Some(PriceReference { predicted_price: Some(0) });
        assert!(listing.predicted_price().is_none());
    }

    #[test]
    fn test_item_key_display() {
        let key = ItemKey::new("M4A4 | Howl (Minimal Wear)", 309);
        assert_eq!(key.to_string(), "M4A4 | Howl (Minimal Wear)|309");
    }
}
