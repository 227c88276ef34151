//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - CSFloat: REST client, retry policy, listing feed and sale history
//! - History: TTL/LRU history cache and the bounded-concurrency fetcher
//! - CLI: Command-line interface and logging setup

pub mod csfloat;
pub mod history;
pub mod cli;

pub use csfloat::{CsFloatHistory, CsFloatListings, ReqwestTransport, RetryPolicy, RetryingClient};
pub use history::{HistoryCache, HistoryFetcher};
pub use cli::CliApp;
