//! CLI Arguments
//!
//! Flags for the watcher. Every tuning flag is optional so that values from
//! the config file survive unless explicitly overridden.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::ports::marketplace::SortKey;

/// csfloat-watcher - CSFloat discount watcher (ML + real sales)
#[derive(Parser, Debug)]
#[command(
    name = "csfloat-watcher",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "CSFloat discount watcher (ML + real sales)",
    long_about = "Polls the CSFloat listing feed, compares every listing against its \
                  predicted price and the median of recent sales, and prints the ones \
                  that beat the configured discount thresholds."
)]
pub struct CliApp {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Text file containing the CSFloat API key
    #[arg(long, value_name = "FILE")]
    pub key_file: Option<String>,

    /// Poll interval in seconds
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// How many listings to fetch per cycle (max 50)
    #[arg(long, value_name = "N")]
    pub limit: Option<u32>,

    /// Initial market sort key
    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,

    /// Print when ML discount >= this percentage (0 = ignore)
    #[arg(long, value_name = "PCT")]
    pub min_ml_discount: Option<f64>,

    /// Print when trade discount >= this percentage (0 = ignore)
    #[arg(long, value_name = "PCT")]
    pub min_trade_discount: Option<f64>,

    /// Consider sales within N days for the median
    #[arg(long, value_name = "DAYS")]
    pub history_days: Option<u32>,

    /// Max sales per item used for the median
    #[arg(long, value_name = "N")]
    pub history_limit: Option<usize>,

    /// Run one cycle then exit
    #[arg(long)]
    pub once: bool,

    /// Seconds a cached sale history stays fresh
    #[arg(long, value_name = "SECS")]
    pub cache_ttl: Option<u64>,

    /// Max items kept in the sale history cache
    #[arg(long, value_name = "N")]
    pub cache_size: Option<usize>,

    /// Concurrent sale history requests
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl CliApp {
    /// Overlay explicitly given flags onto a loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref path) = self.key_file {
            config.api.key_file = path.clone();
        }
        if let Some(secs) = self.interval {
            config.watcher.interval_secs = secs;
        }
        if let Some(limit) = self.limit {
            config.watcher.limit = limit;
        }
        if let Some(sort) = self.sort {
            config.watcher.sort = sort;
        }
        if let Some(pct) = self.min_ml_discount {
            config.watcher.min_ml_discount = pct;
        }
        if let Some(pct) = self.min_trade_discount {
            config.watcher.min_trade_discount = pct;
        }
        if let Some(days) = self.history_days {
            config.history.days = days;
        }
        if let Some(limit) = self.history_limit {
            config.history.limit = limit;
        }
        if let Some(n) = self.concurrency {
            config.history.concurrency = n;
        }
        if let Some(secs) = self.cache_ttl {
            config.cache.ttl_secs = secs;
        }
        if let Some(n) = self.cache_size {
            config.cache.max_entries = n;
        }
        if self.once {
            config.watcher.once = true;
        }
    }
}

/// Initialize logging system
///
/// Logs go to stderr; stdout is reserved for report lines.
pub fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cli_app_parse_defaults() {
        let app = CliApp::try_parse_from(["csfloat-watcher"]).unwrap();

        assert!(app.config.is_none());
        assert!(app.interval.is_none());
        assert!(app.sort.is_none());
        assert!(!app.once);
        assert!(!app.verbose);
        assert!(!app.debug);
    }

    #[test]
    fn test_cli_app_parse_all_flags() {
        let args = [
            "csfloat-watcher",
            "--config",
            "watcher.toml",
            "--key-file",
            "secret.txt",
            "--interval",
            "30",
            "--limit",
            "20",
            "--sort",
            "highest_discount",
            "--min-ml-discount",
            "12.5",
            "--min-trade-discount",
            "8",
            "--history-days",
            "14",
            "--history-limit",
            "25",
            "--once",
            "--cache-ttl",
            "120",
            "--cache-size",
            "64",
            "--concurrency",
            "4",
            "-v",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        assert_eq!(app.config, Some(PathBuf::from("watcher.toml")));
        assert_eq!(app.key_file.as_deref(), Some("secret.txt"));
        assert_eq!(app.interval, Some(30));
        assert_eq!(app.limit, Some(20));
        assert_eq!(app.sort, Some(SortKey::HighestDiscount));
        assert_eq!(app.min_ml_discount, Some(12.5));
        assert_eq!(app.min_trade_discount, Some(8.0));
        assert_eq!(app.history_days, Some(14));
        assert_eq!(app.history_limit, Some(25));
        assert!(app.once);
        assert_eq!(app.cache_ttl, Some(120));
        assert_eq!(app.cache_size, Some(64));
        assert_eq!(app.concurrency, Some(4));
        assert!(app.verbose);
    }

    #[test]
    fn test_cli_app_rejects_unknown_sort() {
        let result = CliApp::try_parse_from(["csfloat-watcher", "--sort", "cheapest"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let mut config = Config::default();
        let app = CliApp::try_parse_from([
            "csfloat-watcher",
            "--interval",
            "5",
            "--min-ml-discount",
            "10",
            "--once",
        ])
        .unwrap();

        app.apply_overrides(&mut config);

        assert_eq!(config.watcher.interval_secs, 5);
        assert_relative_eq!(config.watcher.min_ml_discount, 10.0);
        assert!(config.watcher.once);
        assert_eq!(config.watcher.limit, 50);
        assert_eq!(config.history.days, 7);
        assert_eq!(config.api.key_file, "key.txt");
    }

    #[test]
    fn test_once_flag_does_not_clear_config_once() {
        let mut config = Config::default();
        config.watcher.once = true;

        CliApp::try_parse_from(["csfloat-watcher"])
            .unwrap()
            .apply_overrides(&mut config);

        assert!(config.watcher.once);
    }
}
