//! Report lines
//!
//! One line per bargain:
//! `ML% | trade% | $price | name | link | MM-DD HH:MM`

use super::watcher::Bargain;

/// Printed after each cycle's bargains
pub const SEPARATOR: &str = "----------------------------------------";

/// Placeholder for a signal that could not be computed
pub const MISSING_SIGNAL: &str = "  –  ";

const ITEM_URL_PREFIX: &str = "https://csfloat.com/item/";

pub fn format_bargain(bargain: &Bargain) -> String {
    let listing = &bargain.listing;
    format!(
        "{} | {} | ${:>9} | {} | {} | {}",
        format_signal(bargain.discounts.ml_discount),
        format_signal(bargain.discounts.trade_discount),
        format_dollars(listing.price),
        listing.name(),
        item_url(&listing.id),
        listing.created_at.format("%m-%d %H:%M"),
    )
}

/// `{:5.1}%` or the placeholder
pub fn format_signal(signal: Option<f64>) -> String {
    match signal {
        Some(pct) => format!("{:5.1}%", pct),
        None => MISSING_SIGNAL.to_string(),
    }
}

/// Cents to dollars with thousands separators, e.g. `123456` -> `1,234.56`
pub fn format_dollars(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{}.{:02}", sign, grouped, abs % 100)
}

pub fn item_url(listing_id: &str) -> String {
    format!("{}{}", ITEM_URL_PREFIX, listing_id)
}
