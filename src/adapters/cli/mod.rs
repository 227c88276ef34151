//! CLI Adapter
//!
//! Command-line interface for the CSFloat watcher.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{init_logging, CliApp};

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}
