//! Fetch collaborator backed by reqwest and the local filesystem.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use tracing::{debug, trace};

use crate::domain::errors::FetchError;
use crate::domain::ports::FetchPort;

/// Default user agent for image requests.
pub const DEFAULT_USER_AGENT: &str = concat!("slidecache/", env!("CARGO_PKG_VERSION"));

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Fetches `http`/`https` locators over the network and `file` locators from disk.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a new fetcher.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &HttpFetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    async fn fetch_http(&self, url: Url) -> Result<Option<Bytes>, FetchError> {
        debug!(url = %url, "Downloading image from network");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        trace!(size = bytes.len(), "Download complete");
        Ok(Some(bytes))
    }
}

async fn fetch_file(url: &Url) -> Result<Option<Bytes>, FetchError> {
    let path = url
        .to_file_path()
        .map_err(|()| FetchError::Request(format!("not a local path: {url}")))?;

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            trace!(path = %path.display(), size = bytes.len(), "Read local image");
            Ok(Some(Bytes::from(bytes)))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FetchError::Io(e)),
    }
}

#[async_trait]
impl FetchPort for HttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Option<Bytes>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Request(format!("{url}: {e}")))?;

        match parsed.scheme() {
            "http" | "https" => self.fetch_http(parsed).await,
            "file" => fetch_file(&parsed).await,
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}
