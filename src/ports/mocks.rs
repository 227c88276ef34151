//! Recording test doubles for the port traits.
//!
//! Compiled for unit tests and for the `test-util` feature.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::marketplace::{ClientError, ListingFeed, SaleHistorySource, SortKey};
use super::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::domain::{ItemKey, Listing, SaleRecord};

/// Transport that replays scripted responses and records every request.
///
/// Routes (matched by URL substring) answer every matching request; otherwise
/// the next queued response is used. With nothing left it answers 404 so an
/// unbounded retry loop cannot spin forever in a test.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    routes: Mutex<Vec<(String, HttpResponse)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue a response
    pub fn then_respond(self, status: u16, body: &str) -> Self {
        self.queue
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Builder method to queue a connection-level failure
    pub fn then_fail(self, error: TransportError) -> Self {
        self.queue.lock().unwrap().push_back(Err(error));
        self
    }

    /// Builder method to answer every request whose URL contains `fragment`
    pub fn with_route(self, fragment: &str, status: u16, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((fragment.to_string(), HttpResponse::new(status, body)));
        self
    }

    /// Get all recorded requests
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some((_, response)) = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| request.url.contains(fragment.as_str()))
        {
            return Ok(response.clone());
        }

        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(404, "no scripted response")))
    }
}

/// Listing feed returning a fixed page and recording calls
#[derive(Debug, Default)]
pub struct MockListingFeed {
    listings: Vec<Listing>,
    calls: Mutex<Vec<(SortKey, u32)>>,
}

impl MockListingFeed {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<(SortKey, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingFeed for MockListingFeed {
    async fn fetch_listings(&self, sort: SortKey, limit: u32) -> Result<Vec<Listing>, ClientError> {
        self.calls.lock().unwrap().push((sort, limit));
        Ok(self.listings.iter().take(limit as usize).cloned().collect())
    }
}

/// Sale history source backed by a map, recording calls and peak concurrency
#[derive(Debug, Default)]
pub struct MockSaleHistory {
    histories: HashMap<ItemKey, Vec<SaleRecord>>,
    calls: Mutex<Vec<ItemKey>>,
    latency: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockSaleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the history returned for a key
    pub fn with_history(mut self, key: ItemKey, sales: Vec<SaleRecord>) -> Self {
        self.histories.insert(key, sales);
        self
    }

    /// Builder method to make every fetch take `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<ItemKey> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of fetches observed running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SaleHistorySource for MockSaleHistory {
    async fn fetch_sales(&self, key: &ItemKey) -> Result<Vec<SaleRecord>, ClientError> {
        self.calls.lock().unwrap().push(key.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.histories.get(key).cloned().unwrap_or_default())
    }
}
