//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Fetch collaborator adapters.
pub mod http;
/// Image handling (decoding, disk cache, resolution).
pub mod image;

pub use config::{AppConfig, CliArgs, Command, LogLevel, StorageManager};
pub use self::http::{HttpFetcher, HttpFetcherConfig};
pub use self::image::{DiskImageCache, ImageCodec, ImageResolver, ImageResolverConfig, OutcomeSender};
