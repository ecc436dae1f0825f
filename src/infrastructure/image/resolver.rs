//! Image resolution: disk cache, then inline local fetch, then background
//! network fetch.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::FutureExt;
use image::DynamicImage;
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, trace, warn};

use super::codec::{DecodeLimits, ImageCodec};
use super::disk_cache::{DiskImageCache, DiskUsage};
use crate::domain::entities::{ImageLocator, LoadOutcome, Resolution};
use crate::domain::errors::{CacheResult, ResolveError};
use crate::domain::ports::FetchPort;

/// Tracing target for failures that hint at process-wide resource pressure.
pub const DIAGNOSTICS_TARGET: &str = "slidecache::diagnostics";

/// Listener side of the outcome channel. Receives one outcome per `resolve`.
pub type OutcomeSender = mpsc::UnboundedSender<LoadOutcome>;

/// Configuration for the image resolver.
#[derive(Debug, Clone)]
pub struct ImageResolverConfig {
    /// Maximum background fetches running at once.
    pub max_concurrent_fetches: usize,
    /// Limits applied when decoding.
    pub decode_limits: DecodeLimits,
}

impl Default for ImageResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            decode_limits: DecodeLimits::default(),
        }
    }
}

/// Resolves image locators against the disk cache and the fetch collaborator.
///
/// One instance is built by the composition root and shared behind an `Arc`.
pub struct ImageResolver {
    pipeline: Pipeline,
    runtime: Handle,
    semaphore: Arc<Semaphore>,
    pending: Arc<AtomicUsize>,
    config: ImageResolverConfig,
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver")
            .field("root", &self.pipeline.disk_cache.root())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ImageResolver {
    /// Creates a resolver whose background fetches run on `runtime`.
    #[must_use]
    pub fn new(
        config: ImageResolverConfig,
        disk_cache: Arc<DiskImageCache>,
        fetcher: Arc<dyn FetchPort>,
        runtime: Handle,
    ) -> Self {
        let pipeline = Pipeline {
            disk_cache,
            fetcher,
            codec: Arc::new(ImageCodec::new(config.decode_limits)),
        };

        Self {
            pipeline,
            runtime,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1))),
            pending: Arc::new(AtomicUsize::new(0)),
            config,
        }
    }

    /// Resolves `locator`, delivering exactly one outcome to `listener`.
    ///
    /// Cache hits and local locators are handled inline: the outcome is sent
    /// before this returns and the image is also returned in
    /// [`Resolution::Ready`]. Uncached network locators are fetched on the
    /// background runtime and this returns [`Resolution::Pending`] at once.
    pub async fn resolve(&self, locator: &ImageLocator, listener: &OutcomeSender) -> Resolution {
        if self.pipeline.disk_cache.contains(locator).await {
            let outcome = self.pipeline.read_cached(locator).await;
            let image = outcome.image.clone();
            deliver(listener, outcome);
            return Resolution::Ready(image);
        }

        if !locator.is_network() {
            let outcome = self.pipeline.fetch_guarded(locator).await;
            let image = outcome.image.clone();
            deliver(listener, outcome);
            return Resolution::Ready(image);
        }

        self.spawn_fetch(locator.clone(), listener.clone());
        Resolution::Pending
    }

    /// Resolves `locator` and waits for its outcome, whichever branch serves it.
    pub async fn load(&self, locator: &ImageLocator) -> LoadOutcome {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.resolve(locator, &tx).await;
        drop(tx);

        rx.recv().await.unwrap_or_else(|| {
            error!(locator = %locator, "Resolution ended without an outcome");
            LoadOutcome::failure(locator.clone(), ResolveError::fetch("no outcome delivered"))
        })
    }

    /// Returns true if a cache entry exists for `locator`.
    pub async fn is_cached(&self, locator: &ImageLocator) -> bool {
        self.pipeline.disk_cache.contains(locator).await
    }

    /// Returns the cache entry path for `locator`.
    #[must_use]
    pub fn cache_path(&self, locator: &ImageLocator) -> PathBuf {
        self.pipeline.disk_cache.entry_path(locator)
    }

    /// Removes the cache entry for `locator`.
    pub async fn evict(&self, locator: &ImageLocator) -> bool {
        self.pipeline.disk_cache.evict(locator).await
    }

    /// Removes every cache entry.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be read.
    pub async fn clear(&self) -> CacheResult<usize> {
        self.pipeline.disk_cache.clear().await
    }

    /// Returns the number of entries and bytes on disk.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be read.
    pub async fn usage(&self) -> CacheResult<DiskUsage> {
        self.pipeline.disk_cache.usage().await
    }

    /// Returns the number of background fetches not yet delivered.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    fn spawn_fetch(&self, locator: ImageLocator, listener: OutcomeSender) {
        let pipeline = self.pipeline.clone();
        let semaphore = self.semaphore.clone();
        let pending = self.pending.clone();

        let guard = PendingGuard::new(pending);
        trace!(locator = %locator, "Queued background fetch");

        self.runtime.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let outcome = pipeline.fetch_guarded(&locator).await;
            drop(guard);
            deliver(&listener, outcome);
        });
    }
}

/// Counts one background fetch as pending for as long as it is alive.
///
/// Moved into the spawned task, so the count also drops when the runtime
/// discards the task without polling it to completion.
struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn new(pending: Arc<AtomicUsize>) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self(pending)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fetch, decode and persist steps shared by the inline and background paths.
#[derive(Clone)]
struct Pipeline {
    disk_cache: Arc<DiskImageCache>,
    fetcher: Arc<dyn FetchPort>,
    codec: Arc<ImageCodec>,
}

impl Pipeline {
    async fn read_cached(&self, locator: &ImageLocator) -> LoadOutcome {
        match self.decode_cached(locator).await {
            Ok(image) => {
                debug!(locator = %locator, source = "disk", "Image loaded from cache");
                LoadOutcome::cached(locator.clone(), image)
            }
            Err(e) => {
                error!(locator = %locator, stage = %e.stage(), error = %e, "Failed to load image from cache");
                if e.is_resource_exhaustion() {
                    error!(
                        target: DIAGNOSTICS_TARGET,
                        locator = %locator,
                        error = %e,
                        "Decoder exhausted its resource limits reading the cache"
                    );
                }
                LoadOutcome::failure(locator.clone(), e)
            }
        }
    }

    async fn decode_cached(&self, locator: &ImageLocator) -> Result<Arc<DynamicImage>, ResolveError> {
        let bytes = self
            .disk_cache
            .read(locator)
            .await
            .map_err(|e| ResolveError::cache_read(e.to_string()))?;

        let codec = self.codec.clone();
        let decoded = tokio::task::spawn_blocking(move || codec.decode(&bytes))
            .await
            .map_err(|e| ResolveError::cache_read(format!("Decode task panicked: {e}")))?
            .map_err(|e| {
                if ImageCodec::is_limit_error(&e) {
                    ResolveError::exhausted(e.to_string())
                } else {
                    ResolveError::cache_read(e.to_string())
                }
            })?;

        Ok(Arc::new(decoded))
    }

    /// Runs the fetch sequence, turning a panic anywhere in it into a failure.
    async fn fetch_guarded(&self, locator: &ImageLocator) -> LoadOutcome {
        match AssertUnwindSafe(self.fetch_and_store(locator))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                error!(locator = %locator, "Fetch pipeline panicked");
                LoadOutcome::failure(locator.clone(), ResolveError::fetch("fetch pipeline panicked"))
            }
        }
    }

    async fn fetch_and_store(&self, locator: &ImageLocator) -> LoadOutcome {
        let image = match self.fetch_image(locator).await {
            Ok(image) => image,
            Err(e) => {
                error!(locator = %locator, stage = %e.stage(), error = %e, "Failed to load image");
                return LoadOutcome::failure(locator.clone(), e);
            }
        };

        let modified = if locator.is_network() {
            SystemTime::now()
        } else {
            UNIX_EPOCH
        };
        if let Err(e) = self
            .disk_cache
            .persist(locator, image.clone(), modified)
            .await
        {
            let e = ResolveError::persist(e.to_string());
            warn!(
                locator = %locator,
                stage = %e.stage(),
                error = %e,
                "Failed to save image to cache"
            );
        }

        debug!(locator = %locator, scheme = %locator.scheme(), "Image fetched");
        LoadOutcome::fetched(locator.clone(), image)
    }

    async fn fetch_image(&self, locator: &ImageLocator) -> Result<Arc<DynamicImage>, ResolveError> {
        let bytes = self
            .fetcher
            .fetch_bytes(locator.as_str())
            .await
            .map_err(|e| ResolveError::fetch(e.to_string()))?
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| ResolveError::fetch(format!("got nothing at {locator}")))?;

        let codec = self.codec.clone();
        let decoded = tokio::task::spawn_blocking(move || codec.decode(&bytes))
            .await
            .map_err(|e| ResolveError::decode(format!("Decode task panicked: {e}")))?
            .map_err(|e| ResolveError::decode(e.to_string()))?;

        Ok(Arc::new(decoded))
    }
}

fn deliver(listener: &OutcomeSender, outcome: LoadOutcome) {
    let locator = outcome.locator.clone();
    if listener.send(outcome).is_err() {
        debug!(locator = %locator, "Listener dropped, outcome discarded");
    }
}
