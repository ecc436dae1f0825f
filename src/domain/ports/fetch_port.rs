//! Fetch collaborator port definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::FetchError;

/// Port for fetching raw image bytes.
/// Implementations must be thread-safe.
#[async_trait]
pub trait FetchPort: Send + Sync {
    /// Fetches the bytes behind `url`.
    /// `Ok(None)` means the resource produced nothing.
    async fn fetch_bytes(&self, url: &str) -> Result<Option<Bytes>, FetchError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned reply for a URL.
    #[derive(Debug, Clone)]
    pub enum MockReply {
        /// Return these bytes.
        Data(Bytes),
        /// Return `Ok(None)`.
        Nothing,
        /// Return a request error.
        Error(String),
    }

    /// Mock fetcher returning canned replies and counting calls.
    #[derive(Default)]
    pub struct MockFetcher {
        replies: Mutex<HashMap<String, MockReply>>,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        /// Creates mock with no replies; unknown URLs return `Ok(None)`.
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers a reply for `url`.
        pub fn with_reply(self, url: &str, reply: MockReply) -> Self {
            self.replies
                .lock()
                .unwrap()
                .insert(url.to_string(), reply);
            self
        }

        /// Registers raw bytes for `url`.
        pub fn with_bytes(self, url: &str, bytes: impl Into<Bytes>) -> Self {
            self.with_reply(url, MockReply::Data(bytes.into()))
        }

        /// Number of `fetch_bytes` calls so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FetchPort for MockFetcher {
        async fn fetch_bytes(&self, url: &str) -> Result<Option<Bytes>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.replies.lock().unwrap().get(url).cloned();
            match reply {
                Some(MockReply::Data(bytes)) => Ok(Some(bytes)),
                Some(MockReply::Error(message)) => Err(FetchError::Request(message)),
                Some(MockReply::Nothing) | None => Ok(None),
            }
        }
    }
}
