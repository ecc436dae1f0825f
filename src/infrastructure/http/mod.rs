//! Fetch collaborator adapters.

mod fetcher;

pub use fetcher::{DEFAULT_USER_AGENT, HttpFetcher, HttpFetcherConfig};
