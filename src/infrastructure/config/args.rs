use super::app_config::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "slidecache",
    version,
    about = "Resolve slideshow images through a URL-keyed disk cache",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cache root directory.
    #[arg(long, value_name = "PATH", env = "SLIDECACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Maximum background fetches running at once.
    #[arg(long)]
    pub max_concurrent_fetches: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve one or more image locators.
    Resolve {
        /// Image URLs (`http`, `https` or `file`).
        #[arg(required = true, value_name = "LOCATOR")]
        locators: Vec<String>,

        /// Print a JSON report instead of text lines.
        #[arg(long)]
        json: bool,
    },
    /// Print the cache entry path for a locator.
    Path {
        /// Image URL.
        locator: String,
    },
    /// Remove the cache entry for a locator.
    Evict {
        /// Image URL.
        locator: String,
    },
    /// Remove every cache entry.
    Clear,
    /// Show the number of entries and bytes on disk.
    Stats,
}
