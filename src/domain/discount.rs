//! Discount Engine
//!
//! Computes the two bargain signals for a listing and decides whether it
//! should be reported.
//!
//! - ML discount:    100 * (predicted - price) / predicted
//! - Trade discount: 100 * (median - price) / median, where the median is taken
//!   over recent sales of the same item
//!
//! A positive value means the listing is cheaper than the reference.

use chrono::{DateTime, Duration, Utc};

use super::listing::{Listing, SaleRecord};

/// Signals computed for one listing. Recomputed every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiscountResult {
    /// Discount versus the model prediction, in percent
    pub ml_discount: Option<f64>,
    /// Discount versus the recent sale median, in percent
    pub trade_discount: Option<f64>,
}

/// Minimum discounts a listing must reach to be reported.
///
/// A threshold `<= 0` disables that signal. With both disabled every listing
/// qualifies; otherwise meeting any enabled threshold is enough.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thresholds {
    pub min_ml_discount: f64,
    pub min_trade_discount: f64,
}

impl Thresholds {
    pub fn new(min_ml_discount: f64, min_trade_discount: f64) -> Self {
        Self {
            min_ml_discount,
            min_trade_discount,
        }
    }

    /// Check whether a result passes the configured thresholds
    pub fn qualifies(&self, result: &DiscountResult) -> bool {
        let ml_enabled = self.min_ml_discount > 0.0;
        let trade_enabled = self.min_trade_discount > 0.0;

        if !ml_enabled && !trade_enabled {
            return true;
        }

        let ml_ok = ml_enabled && meets(result.ml_discount, self.min_ml_discount);
        let trade_ok = trade_enabled && meets(result.trade_discount, self.min_trade_discount);
        ml_ok || trade_ok
    }
}

fn meets(signal: Option<f64>, threshold: f64) -> bool {
    signal.is_some_and(|value| value >= threshold)
}

/// Discount engine configured with the history window and thresholds
#[derive(Debug, Clone)]
pub struct DiscountEngine {
    /// Only sales newer than this many days count toward the median
    history_days: i64,
    /// Maximum number of recent sales used for the median
    history_limit: usize,
    thresholds: Thresholds,
}

impl DiscountEngine {
    pub fn new(history_days: u32, history_limit: usize, thresholds: Thresholds) -> Self {
        Self {
            history_days: i64::from(history_days),
            history_limit,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Evaluate a listing against its sale history as of now
    pub fn evaluate(&self, listing: &Listing, history: &[SaleRecord]) -> DiscountResult {
        self.evaluate_at(listing, history, Utc::now())
    }

    /// Evaluate a listing against its sale history as of `now`
    pub fn evaluate_at(
        &self,
        listing: &Listing,
        history: &[SaleRecord],
        now: DateTime<Utc>,
    ) -> DiscountResult {
        let prices = recent_prices(history, now - Duration::days(self.history_days), self.history_limit);

        DiscountResult {
            ml_discount: ml_discount(listing),
            trade_discount: trade_discount(listing.price, &prices),
        }
    }

    /// Shorthand for `thresholds().qualifies(result)`
    pub fn qualifies(&self, result: &DiscountResult) -> bool {
        self.thresholds.qualifies(result)
    }
}

/// Discount versus the model-predicted price.
///
/// `None` when the listing has no prediction or the prediction is zero.
pub fn ml_discount(listing: &Listing) -> Option<f64> {
    let predicted = listing.predicted_price()? as f64;
    Some(100.0 * (predicted - listing.price as f64) / predicted)
}

/// Discount versus the median of `prices`.
///
/// `None` for an empty price list or a non-positive median.
pub fn trade_discount(price: i64, prices: &[i64]) -> Option<f64> {
    let median = median(prices)?;
    if median <= 0.0 {
        return None;
    }
    Some(100.0 * (median - price as f64) / median)
}

/// Prices of sales at or after `cutoff`, in upstream order, truncated to `limit`
pub fn recent_prices(history: &[SaleRecord], cutoff: DateTime<Utc>, limit: usize) -> Vec<i64> {
    history
        .iter()
        .filter(|sale| sale.created_at >= cutoff)
        .take(limit)
        .map(|sale| sale.unit_price)
        .collect()
}

/// Median of integer prices; the mean of the two middle values for even counts
pub fn median(prices: &[i64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }

    let mut sorted = prices.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}
