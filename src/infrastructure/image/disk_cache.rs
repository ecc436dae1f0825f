//! Disk-based image cache keyed by locator host and file name.

use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use image::DynamicImage;
use tokio::fs;
use tracing::{debug, trace, warn};

use super::codec::ImageCodec;
use crate::domain::entities::ImageLocator;
use crate::domain::errors::{CacheError, CacheResult};

/// File name prefix of entries still being written.
const STAGING_PREFIX: &str = ".slidecache-";

/// Number of entries and bytes currently on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskUsage {
    /// Number of cache entries.
    pub entries: usize,
    /// Total size of all entries in bytes.
    pub bytes: u64,
}

impl std::fmt::Display for DiskUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} entries, {} bytes", self.entries, self.bytes)
    }
}

/// Disk cache laid out as `<root>/<host>/<file name>`.
///
/// Existence of an entry is the only hit signal. Entries are never expired.
#[derive(Debug)]
pub struct DiskImageCache {
    cache_dir: PathBuf,
}

impl DiskImageCache {
    /// Creates a new disk cache in the specified directory.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created.
    pub async fn new(cache_dir: PathBuf) -> CacheResult<Self> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to create cache dir: {e}")))?;
        debug!(path = %cache_dir.display(), "Disk cache ready");
        Ok(Self { cache_dir })
    }

    /// Returns the cache root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path of the entry for `locator`.
    #[must_use]
    pub fn entry_path(&self, locator: &ImageLocator) -> PathBuf {
        self.cache_dir.join(locator.cache_key())
    }

    /// Checks if an entry exists for `locator`.
    pub async fn contains(&self, locator: &ImageLocator) -> bool {
        let path = self.entry_path(locator);
        fs::try_exists(&path).await.unwrap_or(false)
    }

    /// Reads the raw bytes of the entry for `locator`.
    ///
    /// # Errors
    /// Returns error if the entry is missing or unreadable.
    pub async fn read(&self, locator: &ImageLocator) -> CacheResult<Vec<u8>> {
        let path = self.entry_path(locator);
        let bytes = fs::read(&path)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read {}: {e}", path.display())))?;
        trace!(locator = %locator, path = %path.display(), size = bytes.len(), "Disk cache read");
        Ok(bytes)
    }

    /// Writes `image` as the entry for `locator`, replacing any previous one.
    ///
    /// The encoding is chosen from the entry's file extension and the file's
    /// modification time is set to `modified`.
    ///
    /// # Errors
    /// Returns error if no encoder matches the extension or the write fails.
    pub async fn persist(
        &self,
        locator: &ImageLocator,
        image: Arc<DynamicImage>,
        modified: SystemTime,
    ) -> CacheResult<PathBuf> {
        let path = self.entry_path(locator);
        let task_path = path.clone();

        tokio::task::spawn_blocking(move || write_entry(&task_path, &image, modified))
            .await
            .map_err(|e| CacheError::EncodeError(format!("Encode task panicked: {e}")))??;

        debug!(locator = %locator, path = %path.display(), "Stored image in disk cache");
        Ok(path)
    }

    /// Removes the entry for `locator`. Returns true if a file was removed.
    pub async fn evict(&self, locator: &ImageLocator) -> bool {
        let path = self.entry_path(locator);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(locator = %locator, "Evicted from disk cache");
                true
            }
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!(locator = %locator, error = %e, "Failed to evict from disk cache");
                }
                false
            }
        }
    }

    /// Clears the entire disk cache. Returns the number of entries removed.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be read.
    pub async fn clear(&self) -> CacheResult<usize> {
        let mut removed = 0usize;
        for (path, _) in self.entries().await? {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove cache file"),
            }
        }

        let mut hosts = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;
        while let Ok(Some(entry)) = hosts.next_entry().await {
            let path = entry.path();
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            if is_dir && fs::remove_dir(&path).await.is_err() {
                trace!(path = %path.display(), "Host directory not empty, kept");
            }
        }

        debug!(removed = removed, "Cleared disk cache");
        Ok(removed)
    }

    /// Returns the number of entries and total bytes on disk.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be read.
    pub async fn usage(&self) -> CacheResult<DiskUsage> {
        let entries = self.entries().await?;
        Ok(DiskUsage {
            entries: entries.len(),
            bytes: entries.iter().map(|(_, size)| size).sum(),
        })
    }

    /// Lists every `<host>/<file>` entry with its size.
    async fn entries(&self) -> CacheResult<Vec<(PathBuf, u64)>> {
        let mut files = Vec::new();
        let mut hosts = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;

        while let Some(host) = hosts
            .next_entry()
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read entry: {e}")))?
        {
            let Ok(mut items) = fs::read_dir(host.path()).await else {
                continue;
            };
            while let Ok(Some(item)) = items.next_entry().await {
                if item.file_name().to_string_lossy().starts_with(STAGING_PREFIX) {
                    continue;
                }
                if let Ok(meta) = item.metadata().await
                    && meta.is_file()
                {
                    files.push((item.path(), meta.len()));
                }
            }
        }

        Ok(files)
    }
}

/// Replaces the file at `path` with `image` encoded by the path's suffix.
///
/// The image is encoded into a staging file next to `path` and renamed over
/// the previous entry, so readers see either the old or the new file whole.
fn write_entry(path: &Path, image: &DynamicImage, modified: SystemTime) -> CacheResult<()> {
    let format = ImageCodec::format_for_path(path)
        .ok_or_else(|| CacheError::UnsupportedFormat(path.display().to_string()))?;
    let parent = path
        .parent()
        .ok_or_else(|| CacheError::IoError(format!("No parent for {}", path.display())))?;

    std::fs::create_dir_all(parent)
        .map_err(|e| CacheError::IoError(format!("Failed to create host dir: {e}")))?;

    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(parent)
        .map_err(|e| CacheError::IoError(format!("Failed to create staging file: {e}")))?;

    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        ImageCodec::encode(image, &mut writer, format)
            .map_err(|e| CacheError::EncodeError(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| CacheError::IoError(format!("Failed to flush entry: {e}")))?;
    }

    staged
        .as_file()
        .set_modified(modified)
        .map_err(|e| CacheError::IoError(format!("Failed to set modification time: {e}")))?;

    staged
        .persist(path)
        .map_err(|e| CacheError::IoError(format!("Failed to move entry into place: {}", e.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::image::codec::fixtures::png_bytes;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    async fn create_test_cache() -> (DiskImageCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskImageCache::new(temp_dir.path().join("images"))
            .await
            .unwrap();
        (cache, temp_dir)
    }

    fn decoded(width: u32, height: u32) -> Arc<DynamicImage> {
        Arc::new(
            ImageCodec::default()
                .decode(&png_bytes(width, height))
                .unwrap(),
        )
    }

    fn locator(url: &str) -> ImageLocator {
        ImageLocator::parse(url).unwrap()
    }

    #[tokio::test]
    async fn test_entry_path_layout() {
        let (cache, _temp) = create_test_cache().await;
        let path = cache.entry_path(&locator("http://img.example/a/b.png"));
        assert_eq!(path, cache.root().join("img.example").join("b.png"));

        let local = cache.entry_path(&locator("file:///opt/slides/c.png"));
        assert_eq!(local, cache.root().join("localhost").join("c.png"));
    }

    #[tokio::test]
    async fn test_persist_round_trip_is_lossless() {
        let (cache, _temp) = create_test_cache().await;
        let loc = locator("http://img.example/a/b.png");
        let image = decoded(10, 10);

        assert!(!cache.contains(&loc).await);
        cache
            .persist(&loc, image.clone(), SystemTime::now())
            .await
            .unwrap();
        assert!(cache.contains(&loc).await);

        let bytes = cache.read(&loc).await.unwrap();
        let reread = ImageCodec::default().decode(&bytes).unwrap();
        assert_eq!(reread.to_rgba8(), image.to_rgba8());
    }

    #[tokio::test]
    async fn test_persist_replaces_existing_entry() {
        let (cache, _temp) = create_test_cache().await;
        let loc = locator("http://img.example/b.png");

        cache
            .persist(&loc, decoded(4, 4), SystemTime::now())
            .await
            .unwrap();
        cache
            .persist(&loc, decoded(7, 3), SystemTime::now())
            .await
            .unwrap();

        let reread = ImageCodec::default()
            .decode(&cache.read(&loc).await.unwrap())
            .unwrap();
        assert_eq!((reread.width(), reread.height()), (7, 3));
        assert_eq!(cache.usage().await.unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_persist_sets_modification_time() {
        let (cache, _temp) = create_test_cache().await;
        let loc = locator("file:///opt/slides/c.png");

        let path = cache.persist(&loc, decoded(2, 2), UNIX_EPOCH).await.unwrap();

        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert!(modified < UNIX_EPOCH + Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_persist_unknown_suffix_fails_without_entry() {
        let (cache, _temp) = create_test_cache().await;
        let loc = locator("http://img.example/photo.unknown");

        let result = cache.persist(&loc, decoded(2, 2), SystemTime::now()).await;

        assert!(matches!(result, Err(CacheError::UnsupportedFormat(_))));
        assert!(!cache.contains(&loc).await);
    }

    #[tokio::test]
    async fn test_evict() {
        let (cache, _temp) = create_test_cache().await;
        let loc = locator("http://img.example/b.png");

        cache
            .persist(&loc, decoded(2, 2), SystemTime::now())
            .await
            .unwrap();
        assert!(cache.evict(&loc).await);
        assert!(!cache.contains(&loc).await);
        assert!(!cache.evict(&loc).await);
    }

    #[tokio::test]
    async fn test_clear_and_usage() {
        let (cache, _temp) = create_test_cache().await;

        for url in [
            "http://a.example/1.png",
            "http://a.example/2.png",
            "http://b.example/3.png",
        ] {
            cache
                .persist(&locator(url), decoded(2, 2), SystemTime::now())
                .await
                .unwrap();
        }

        let usage = cache.usage().await.unwrap();
        assert_eq!(usage.entries, 3);
        assert!(usage.bytes > 0);

        assert_eq!(cache.clear().await.unwrap(), 3);
        assert_eq!(cache.usage().await.unwrap(), DiskUsage::default());
        assert!(cache.root().exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rewrite_never_exposes_partial_entry() {
        let (cache, _temp) = create_test_cache().await;
        let cache = Arc::new(cache);
        let loc = locator("http://img.example/large.png");
        let image = decoded(600, 600);
        cache
            .persist(&loc, image.clone(), SystemTime::now())
            .await
            .unwrap();

        let writer = {
            let cache = cache.clone();
            let loc = loc.clone();
            tokio::spawn(async move {
                for _ in 0..20 {
                    cache
                        .persist(&loc, image.clone(), SystemTime::now())
                        .await
                        .unwrap();
                }
            })
        };

        let codec = ImageCodec::default();
        while !writer.is_finished() {
            let bytes = cache.read(&loc).await.expect("entry vanished while rewritten");
            let reread = codec.decode(&bytes).expect("entry read while rewritten");
            assert_eq!((reread.width(), reread.height()), (600, 600));
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();

        let settled = codec.decode(&cache.read(&loc).await.unwrap()).unwrap();
        assert_eq!(settled.width(), 600);
        assert_eq!(cache.usage().await.unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_read_missing_entry() {
        let (cache, _temp) = create_test_cache().await;
        let result = cache.read(&locator("http://img.example/none.png")).await;
        assert!(matches!(result, Err(CacheError::IoError(_))));
    }
}
