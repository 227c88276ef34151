//! History Fetcher
//!
//! Resolves the sale history for a batch of distinct items. Cached entries
//! are served from the `HistoryCache`; the rest are fetched with bounded
//! concurrency and written back to the cache.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use super::cache::HistoryCache;
use crate::domain::{ItemKey, SaleRecord};
use crate::ports::marketplace::{ClientError, SaleHistorySource};

/// Default number of concurrent history requests
pub const DEFAULT_HISTORY_CONCURRENCY: usize = 1;

/// Cache-backed, concurrency-limited sale history resolver
#[derive(Clone)]
pub struct HistoryFetcher {
    source: Arc<dyn SaleHistorySource>,
    cache: Arc<HistoryCache>,
    concurrency: usize,
}

impl HistoryFetcher {
    pub fn new(source: Arc<dyn SaleHistorySource>, cache: Arc<HistoryCache>, concurrency: usize) -> Self {
        Self {
            source,
            cache,
            concurrency: concurrency.max(1),
        }
    }

    pub fn cache(&self) -> &Arc<HistoryCache> {
        &self.cache
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Resolve every key to its sale history.
    ///
    /// Each key is fetched at most once; all fetches finish before the map is
    /// returned. The in-flight limit only lives for the duration of this call.
    pub async fn resolve(
        &self,
        keys: &BTreeSet<ItemKey>,
    ) -> Result<HashMap<ItemKey, Vec<SaleRecord>>, ClientError> {
        let start = Instant::now();
        let mut resolved = HashMap::with_capacity(keys.len());
        let mut misses = Vec::new();

        for key in keys {
            match self.cache.get(key) {
                Some(sales) => {
                    resolved.insert(key.clone(), sales);
                }
                None => misses.push(key.clone()),
            }
        }

        let cached = resolved.len();
        let to_fetch = misses.len();

        let fetched: Vec<Result<(ItemKey, Vec<SaleRecord>), ClientError>> = stream::iter(misses)
            .map(|key| async move {
                let sales = self.source.fetch_sales(&key).await?;
                self.cache.put(key.clone(), sales.clone());
                Ok((key, sales))
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for result in fetched {
            let (key, sales) = result?;
            debug!("Fetched {} sales for {}", sales.len(), key);
            resolved.insert(key, sales);
        }

        if to_fetch > 0 {
            info!(
                "Resolved history for {} items ({} cached, {} fetched) in {}ms",
                resolved.len(),
                cached,
                to_fetch,
                start.elapsed().as_millis()
            );
        } else {
            debug!("Resolved history for {} items from cache", resolved.len());
        }

        Ok(resolved)
    }
}
