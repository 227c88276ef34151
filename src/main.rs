//! csfloat-watcher - CSFloat discount watcher
//!
//! Prints listings that beat the ML and trade-median discount thresholds.

use anyhow::{Context, Result};
use std::sync::Arc;

use csfloat_watcher::adapters::cli::{self, init_logging};
use csfloat_watcher::adapters::csfloat::{
    CsFloatConfig, CsFloatHistory, CsFloatListings, ReqwestTransport, RetryingClient,
};
use csfloat_watcher::adapters::history::{HistoryCache, HistoryFetcher};
use csfloat_watcher::application::{BargainWatcher, WatcherSettings};
use csfloat_watcher::config::{load_config, read_api_key, Config};
use csfloat_watcher::domain::DiscountEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (CSFLOAT_API_KEY may live there)
    dotenvy::dotenv().ok();

    let app = cli::init();
    init_logging(app.verbose, app.debug);

    let mut config = match app.config {
        Some(ref path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    app.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    let api_key = read_api_key(&config.api.key_file)?;

    let client_config = CsFloatConfig::from(&config);
    let transport = ReqwestTransport::new(client_config.timeout)
        .context("Failed to create HTTP client")?;
    let client = RetryingClient::new(Arc::new(transport), api_key, client_config.retry.clone());

    let listings = CsFloatListings::new(client.clone(), &client_config.api_base_url);
    let history = CsFloatHistory::new(client, &client_config.api_base_url)
        .context("Invalid API base URL")?;

    let cache = Arc::new(HistoryCache::new(config.cache_ttl(), config.cache.max_entries));
    let fetcher = HistoryFetcher::new(Arc::new(history), cache, config.history.concurrency);
    let engine = DiscountEngine::new(config.history.days, config.history.limit, config.thresholds());
    let settings = WatcherSettings::from(&config);

    tracing::info!(
        "every {}s  limit={}  sort={}  ml>={}%  trade>={}%  hist={}d",
        config.watcher.interval_secs,
        config.watcher.limit,
        config.watcher.sort,
        config.watcher.min_ml_discount,
        config.watcher.min_trade_discount,
        config.history.days
    );

    let watcher = BargainWatcher::new(Arc::new(listings), fetcher, engine, settings);

    // Setup Ctrl+C handler
    let w = watcher.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        w.stop().await;
    });

    watcher.run().await?;
    Ok(())
}
