//! Domain Layer - Core types and discount logic for the bargain watcher
//!
//! Pure types and calculations with no I/O. Network access happens through the
//! ports layer.
//!
//! - `listing`: Listing, SaleRecord and the ItemKey that joins them
//! - `discount`: ML / trade discount computation and the report filter

pub mod listing;
pub mod discount;

pub use listing::{ItemKey, ListedItem, Listing, PriceReference, SaleRecord};
pub use discount::{
    median, ml_discount, recent_prices, trade_discount, DiscountEngine, DiscountResult,
    Thresholds,
};
