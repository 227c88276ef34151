//! Bargain Watcher
//!
//! Runs the poll cycle: fetch listings, resolve sale history for the distinct
//! items, evaluate discounts and report the listings that qualify.

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{Notify, RwLock};

use super::report::{format_bargain, SEPARATOR};
use crate::adapters::history::HistoryFetcher;
use crate::domain::{DiscountEngine, DiscountResult, ItemKey, Listing};
use crate::ports::marketplace::{ClientError, ListingFeed, SortKey};

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Marketplace error: {0}")]
    Client(#[from] ClientError),
    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

/// Loop settings
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherSettings {
    /// Sleep between the end of one cycle and the start of the next
    pub interval: Duration,
    /// Listings requested per cycle
    pub limit: u32,
    pub sort: SortKey,
    /// Run a single cycle and return
    pub once: bool,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            limit: 50,
            sort: SortKey::MostRecent,
            once: false,
        }
    }
}

/// A listing that passed the discount thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct Bargain {
    pub listing: Listing,
    pub discounts: DiscountResult,
}

/// Poll loop tying the listing feed, history fetcher and discount engine together
#[derive(Clone)]
pub struct BargainWatcher {
    feed: Arc<dyn ListingFeed>,
    history: HistoryFetcher,
    engine: DiscountEngine,
    settings: WatcherSettings,
    is_running: Arc<RwLock<bool>>,
    stop_requested: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl BargainWatcher {
    pub fn new(
        feed: Arc<dyn ListingFeed>,
        history: HistoryFetcher,
        engine: DiscountEngine,
        settings: WatcherSettings,
    ) -> Self {
        Self {
            feed,
            history,
            engine,
            settings,
            is_running: Arc::new(RwLock::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn settings(&self) -> &WatcherSettings {
        &self.settings
    }

    pub fn history(&self) -> &HistoryFetcher {
        &self.history
    }

    /// Run the poll loop, printing report lines to stdout
    pub async fn run(&self) -> Result<(), WatcherError> {
        let mut stdout = std::io::stdout();
        self.run_with_output(&mut stdout).await
    }

    /// Run the poll loop, writing report lines to `out`.
    ///
    /// A failed cycle is logged and the loop carries on; with `once` set the
    /// error is returned instead. `stop()` abandons the cycle in flight,
    /// including any retry sleep inside it.
    pub async fn run_with_output<W: Write + Send>(&self, out: &mut W) -> Result<(), WatcherError> {
        if self.stop_requested.load(Ordering::SeqCst) {
            tracing::info!("Stop requested before start; not running");
            return Ok(());
        }
        *self.is_running.write().await = true;

        tracing::info!(
            "Starting bargain watcher - interval: {:?}, limit: {}, sort: {}, once: {}",
            self.settings.interval,
            self.settings.limit,
            self.settings.sort,
            self.settings.once
        );

        let result = self.poll_loop(out).await;

        *self.is_running.write().await = false;
        tracing::info!("Bargain watcher stopped");
        result
    }

    async fn poll_loop<W: Write + Send>(&self, out: &mut W) -> Result<(), WatcherError> {
        while !self.stop_requested.load(Ordering::SeqCst) {
            let outcome = tokio::select! {
                result = self.tick() => Some(result),
                _ = self.shutdown.notified() => None,
            };

            let Some(result) = outcome else {
                tracing::info!("Cycle abandoned on shutdown");
                break;
            };

            match result {
                Ok(bargains) => {
                    for bargain in &bargains {
                        writeln!(out, "{}", format_bargain(bargain))?;
                    }
                    writeln!(out, "{}", SEPARATOR)?;
                    out.flush()?;
                }
                Err(e) if self.settings.once => return Err(e),
                Err(e) => tracing::error!("Cycle failed: {}", e),
            }

            if self.settings.once {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {}
                _ = self.shutdown.notified() => {}
            }
        }

        Ok(())
    }

    /// Execute one poll cycle and return the qualifying listings
    pub async fn tick(&self) -> Result<Vec<Bargain>, WatcherError> {
        let listings = self
            .feed
            .fetch_listings(self.settings.sort, self.settings.limit)
            .await?;
        let fetched = listings.len();

        // History is queried per variant; listings without one are dropped here
        let keyed: Vec<(Listing, ItemKey)> = listings
            .into_iter()
            .filter_map(|listing| listing.item_key().map(|key| (listing, key)))
            .collect();
        let with_paint_index = keyed.len();

        let keys: BTreeSet<ItemKey> = keyed.iter().map(|(_, key)| key.clone()).collect();
        let purged = self.history.cache().purge_expired();
        let histories = self.history.resolve(&keys).await?;

        let now = Utc::now();
        let bargains: Vec<Bargain> = keyed
            .into_iter()
            .filter_map(|(listing, key)| {
                let sales = histories.get(&key).map(Vec::as_slice).unwrap_or_default();
                let discounts = self.engine.evaluate_at(&listing, sales, now);
                self.engine
                    .qualifies(&discounts)
                    .then_some(Bargain { listing, discounts })
            })
            .collect();

        let stats = self.history.cache().stats();
        tracing::info!(
            "Cycle: {} listings, {} with paint index, {} distinct items, {} bargains",
            fetched,
            with_paint_index,
            keys.len(),
            bargains.len()
        );
        tracing::debug!(
            "History cache: {} entries, {} hits, {} misses, {} evictions, {} purged this cycle",
            stats.entries,
            stats.hits,
            stats.misses,
            stats.evictions,
            purged
        );

        Ok(bargains)
    }

    /// Stop the loop; an in-progress cycle or sleep is cut short.
    ///
    /// Also takes effect when called before `run`.
    pub async fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
        tracing::info!("Stop signal sent to watcher");
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::history::HistoryCache;
    use crate::domain::{ListedItem, PriceReference, SaleRecord, Thresholds};
    use crate::ports::mocks::{MockListingFeed, MockSaleHistory};
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    fn listing(id: &str, name: &str, paint_index: Option<i64>, price: i64, predicted: Option<i64>) -> Listing {
        Listing {
            id: id.to_string(),
            price,
            created_at: Utc::now(),
            item: ListedItem {
                market_hash_name: name.to_string(),
                paint_index,
            },
            reference: Some(PriceReference {
                predicted_price: predicted,
            }),
        }
    }

    fn recent_sales(prices: &[i64]) -> Vec<SaleRecord> {
        prices
            .iter()
            .map(|&p| SaleRecord::new(p, Utc::now() - ChronoDuration::hours(1)))
            .collect()
    }

    fn watcher(
        feed: Arc<dyn ListingFeed>,
        history: Arc<MockSaleHistory>,
        thresholds: Thresholds,
        settings: WatcherSettings,
    ) -> BargainWatcher {
        let cache = Arc::new(HistoryCache::new(Duration::from_secs(600), 64));
        BargainWatcher::new(
            feed,
            HistoryFetcher::new(history, cache, 1),
            DiscountEngine::new(7, 40, thresholds),
            settings,
        )
    }

    fn once() -> WatcherSettings {
        WatcherSettings {
            once: true,
            ..WatcherSettings::default()
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl ListingFeed for FailingFeed {
        async fn fetch_listings(&self, _sort: SortKey, _limit: u32) -> Result<Vec<Listing>, ClientError> {
            let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            Err(ClientError::Decode {
                url: "https://api.test/listings".to_string(),
                source,
            })
        }
    }

    struct StalledFeed;

    #[async_trait]
    impl ListingFeed for StalledFeed {
        async fn fetch_listings(&self, _sort: SortKey, _limit: u32) -> Result<Vec<Listing>, ClientError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_tick_skips_listings_without_paint_index() {
        let feed = Arc::new(MockListingFeed::new(vec![
            listing("1", "Sticker | Crown (Foil)", None, 1000, Some(2000)),
            listing("2", "AWP | Safari Mesh", Some(0), 1000, Some(2000)),
            listing("3", "AK-47 | Redline", Some(282), 1000, Some(2000)),
        ]));
        let history = Arc::new(MockSaleHistory::new());
        let w = watcher(feed, history.clone(), Thresholds::default(), once());

        let bargains = w.tick().await.unwrap();

        assert_eq!(history.get_calls(), vec![ItemKey::new("AK-47 | Redline", 282)]);
        assert_eq!(bargains.len(), 1);
        assert_eq!(bargains[0].listing.id, "3");
    }

    #[tokio::test]
    async fn test_tick_fetches_shared_history_once() {
        let key = ItemKey::new("M4A4 | Howl", 309);
        let feed = Arc::new(MockListingFeed::new(vec![
            listing("a", "M4A4 | Howl", Some(309), 900, None),
            listing("b", "M4A4 | Howl", Some(309), 1100, None),
            listing("c", "Glock-18 | Fade", Some(38), 500, None),
        ]));
        let history = Arc::new(
            MockSaleHistory::new().with_history(key.clone(), recent_sales(&[1000, 1000, 1000])),
        );
        let w = watcher(feed, history.clone(), Thresholds::default(), once());

        let bargains = w.tick().await.unwrap();

        assert_eq!(history.get_calls().len(), 2);
        assert_eq!(bargains.len(), 3);
        assert_relative_eq!(bargains[0].discounts.trade_discount.unwrap(), 10.0);
        assert_relative_eq!(bargains[1].discounts.trade_discount.unwrap(), -10.0);
        assert!(bargains[2].discounts.trade_discount.is_none());
    }

    #[tokio::test]
    async fn test_tick_applies_thresholds() {
        let feed = Arc::new(MockListingFeed::new(vec![
            listing("twelve", "Item A", Some(1), 880, Some(1000)),
            listing("five", "Item B", Some(2), 950, Some(1000)),
            listing("none", "Item C", Some(3), 950, None),
        ]));
        let history = Arc::new(MockSaleHistory::new());
        let w = watcher(feed, history, Thresholds::new(10.0, 0.0), once());

        let bargains = w.tick().await.unwrap();

        let ids: Vec<&str> = bargains.iter().map(|b| b.listing.id.as_str()).collect();
        assert_eq!(ids, vec!["twelve"]);
        assert_relative_eq!(bargains[0].discounts.ml_discount.unwrap(), 12.0);
    }

    #[tokio::test]
    async fn test_tick_passes_sort_and_limit() {
        let feed = Arc::new(MockListingFeed::new(Vec::new()));
        let settings = WatcherSettings {
            limit: 20,
            sort: SortKey::HighestDiscount,
            ..once()
        };
        let w = watcher(feed.clone(), Arc::new(MockSaleHistory::new()), Thresholds::default(), settings);

        assert!(w.tick().await.unwrap().is_empty());
        assert_eq!(feed.get_calls(), vec![(SortKey::HighestDiscount, 20)]);
    }

    #[tokio::test]
    async fn test_run_once_writes_report() {
        let feed = Arc::new(MockListingFeed::new(vec![
            listing("77", "AK-47 | Redline", Some(282), 1000, Some(1200)),
        ]));
        let w = watcher(feed.clone(), Arc::new(MockSaleHistory::new()), Thresholds::default(), once());
        let mut out = Vec::new();

        w.run_with_output(&mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" 16.7% |   –   | $    10.00 | AK-47 | Redline | "));
        assert!(lines[0].contains("https://csfloat.com/item/77"));
        assert_eq!(lines[1], SEPARATOR);
        assert_eq!(feed.get_calls().len(), 1);
        assert!(!w.is_running().await);
    }

    #[tokio::test]
    async fn test_run_once_propagates_cycle_error() {
        let w = watcher(Arc::new(FailingFeed), Arc::new(MockSaleHistory::new()), Thresholds::default(), once());
        let mut out = Vec::new();

        let result = w.run_with_output(&mut out).await;

        assert!(matches!(result, Err(WatcherError::Client(ClientError::Decode { .. }))));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_stop_interrupts_sleep() {
        let feed = Arc::new(MockListingFeed::new(Vec::new()));
        let settings = WatcherSettings {
            interval: Duration::from_secs(3600),
            ..WatcherSettings::default()
        };
        let w = watcher(feed.clone(), Arc::new(MockSaleHistory::new()), Thresholds::default(), settings);

        let runner = w.clone();
        let handle = tokio::spawn(async move {
            let mut out = Vec::new();
            runner.run_with_output(&mut out).await.map(|_| out)
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(w.is_running().await);
        w.stop().await;

        let out = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watcher did not stop")
            .unwrap()
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", SEPARATOR));
        assert_eq!(feed.get_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_loop_alive() {
        let settings = WatcherSettings {
            interval: Duration::from_millis(10),
            ..WatcherSettings::default()
        };
        let w = watcher(Arc::new(FailingFeed), Arc::new(MockSaleHistory::new()), Thresholds::default(), settings);

        let runner = w.clone();
        let handle = tokio::spawn(async move {
            let mut out = Vec::new();
            runner.run_with_output(&mut out).await
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(w.is_running().await);
        w.stop().await;

        let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_stop_before_run_is_honoured() {
        let feed = Arc::new(MockListingFeed::new(Vec::new()));
        let w = watcher(feed.clone(), Arc::new(MockSaleHistory::new()), Thresholds::default(), WatcherSettings::default());
        let mut out = Vec::new();

        w.stop().await;
        let result = tokio::time::timeout(Duration::from_secs(5), w.run_with_output(&mut out)).await;

        assert!(result.expect("run ignored an early stop").is_ok());
        assert!(feed.get_calls().is_empty());
        assert!(out.is_empty());
        assert!(!w.is_running().await);
    }

    #[tokio::test]
    async fn test_stop_abandons_cycle_in_flight() {
        let w = watcher(Arc::new(StalledFeed), Arc::new(MockSaleHistory::new()), Thresholds::default(), WatcherSettings::default());

        let runner = w.clone();
        let handle = tokio::spawn(async move {
            let mut out = Vec::new();
            runner.run_with_output(&mut out).await.map(|_| out)
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(w.is_running().await);
        w.stop().await;

        let out = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watcher did not stop")
            .unwrap()
            .unwrap();
        assert!(out.is_empty());
        assert!(!w.is_running().await);
    }

    #[tokio::test]
    async fn test_tick_purges_expired_history() {
        let stale = ItemKey::new("Stale", 1);
        let feed = Arc::new(MockListingFeed::new(Vec::new()));
        let cache = Arc::new(HistoryCache::new(Duration::from_millis(20), 8));
        cache.put(stale.clone(), Vec::new());
        let w = BargainWatcher::new(
            feed,
            HistoryFetcher::new(Arc::new(MockSaleHistory::new()), cache.clone(), 1),
            DiscountEngine::new(7, 40, Thresholds::default()),
            once(),
        );

        tokio::time::sleep(Duration::from_millis(40)).await;
        w.tick().await.unwrap();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().expirations, 1);
    }
}
