//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - HTTP transport (the only thing that touches the network)
//! - The marketplace listing feed
//! - Per-item sale history

pub mod transport;
pub mod marketplace;
#[cfg(any(test, feature = "test-util"))]
pub mod mocks;

pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
pub use marketplace::{ClientError, ListingFeed, SaleHistorySource, SortKey};
