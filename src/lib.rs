//! csfloat-watcher - CSFloat bargain watcher library
//!
//! Polls the CSFloat listing feed and flags listings priced below their
//! model prediction or the median of recent sales.
//!
//! # Modules
//!
//! - `domain`: Core types and discount math (Listing, SaleRecord, DiscountEngine)
//! - `ports`: Trait abstractions (HttpTransport, ListingFeed, SaleHistorySource)
//! - `adapters`: External implementations (CSFloat client, history cache, CLI)
//! - `config`: Configuration loading, validation and API key resolution
//! - `application`: Poll loop and report formatting

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
