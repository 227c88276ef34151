//! Sale History Adapter
//!
//! Caching and batched resolution of per-item sale history:
//! - `HistoryCache`: TTL + LRU cache, safe to share between tasks
//! - `HistoryFetcher`: resolves a batch of item keys with bounded concurrency

mod cache;
mod fetcher;

pub use cache::{CacheStats, HistoryCache};
pub use fetcher::{HistoryFetcher, DEFAULT_HISTORY_CONCURRENCY};
