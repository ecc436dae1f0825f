//! Batch resolution use case.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::entities::{ImageLocator, LoadOutcome};
use crate::infrastructure::image::ImageResolver;

/// Resolves several locators over one listener channel and collects every outcome.
#[derive(Clone)]
pub struct ResolveBatchUseCase {
    resolver: Arc<ImageResolver>,
}

impl ResolveBatchUseCase {
    /// Creates new batch use case.
    #[must_use]
    pub const fn new(resolver: Arc<ImageResolver>) -> Self {
        Self { resolver }
    }

    /// Resolves `locators` and waits for one outcome per locator.
    /// Outcomes are returned in delivery order.
    pub async fn execute(&self, locators: &[ImageLocator]) -> Vec<LoadOutcome> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut pending = 0usize;
        for locator in locators {
            if self.resolver.resolve(locator, &tx).await.is_pending() {
                pending += 1;
            }
        }
        drop(tx);
        debug!(
            total = locators.len(),
            pending = pending,
            "Batch submitted, awaiting outcomes"
        );

        let mut outcomes = Vec::with_capacity(locators.len());
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        info!(
            total = outcomes.len(),
            failed = outcomes.iter().filter(|o| o.failed).count(),
            "Batch resolved"
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockFetcher;
    use crate::infrastructure::image::codec::fixtures::png_bytes;
    use crate::infrastructure::image::{DiskImageCache, ImageResolverConfig};
    use tokio::runtime::Handle;

    #[tokio::test]
    async fn test_one_outcome_per_locator() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let disk_cache = Arc::new(
            DiskImageCache::new(temp_dir.path().to_path_buf())
                .await
                .unwrap(),
        );
        let fetcher = MockFetcher::new()
            .with_bytes("http://img.example/a.png", png_bytes(2, 2))
            .with_bytes("file:///opt/slides/b.png", png_bytes(3, 3));
        let resolver = Arc::new(ImageResolver::new(
            ImageResolverConfig::default(),
            disk_cache,
            Arc::new(fetcher),
            Handle::current(),
        ));
        let use_case = ResolveBatchUseCase::new(resolver);

        let locators: Vec<ImageLocator> = [
            "http://img.example/a.png",
            "file:///opt/slides/b.png",
            "http://img.example/missing.png",
        ]
        .iter()
        .map(|url| ImageLocator::parse(url).unwrap())
        .collect();

        let outcomes = use_case.execute(&locators).await;
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.failed).count(), 1);

        let again = use_case.execute(&locators[..2]).await;
        assert!(again.iter().all(|o| o.from_cache));
    }
}
