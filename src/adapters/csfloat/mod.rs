//! CSFloat Adapter
//!
//! Implementation of the marketplace ports against the CSFloat REST API.
//! Handles authentication, rate-limit retries, listing pages and sale history.

mod client;
mod history;
mod listings;
mod retry;
mod transport;

pub use client::{CsFloatConfig, RetryingClient, DEFAULT_API_BASE_URL};
pub use history::{parse_sales, CsFloatHistory};
pub use listings::{parse_listing_page, CsFloatListings, MAX_PAGE_LIMIT, MIN_PRICE_CENTS};
pub use retry::RetryPolicy;
pub use transport::ReqwestTransport;
