//! Application Layer - Poll loop and report output

pub mod report;
pub mod watcher;

pub use report::{format_bargain, format_dollars, format_signal, item_url, SEPARATOR};
pub use watcher::{Bargain, BargainWatcher, WatcherError, WatcherSettings};
