//! Results of image resolution.

use std::sync::Arc;

use image::DynamicImage;

use super::ImageLocator;
use crate::domain::errors::ResolveError;

/// Where a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Decoded from an existing cache entry.
    DiskCache,
    /// Fetched inline from a local (non-network) locator.
    Local,
    /// Fetched in the background from the network.
    Network,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiskCache => write!(f, "disk"),
            Self::Local => write!(f, "local"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Outcome delivered exactly once per `resolve` call.
///
/// `from_cache` and `failed` are never both set. Both unset means the image
/// was freshly fetched.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Locator that was resolved.
    pub locator: ImageLocator,
    /// Decoded image, absent on failure.
    pub image: Option<Arc<DynamicImage>>,
    /// True if served from an existing cache entry.
    pub from_cache: bool,
    /// True if resolution failed.
    pub failed: bool,
    /// Cause of the failure, when `failed` is set.
    pub error: Option<ResolveError>,
}

impl LoadOutcome {
    /// Image decoded from the disk cache.
    #[must_use]
    pub const fn cached(locator: ImageLocator, image: Arc<DynamicImage>) -> Self {
        Self {
            locator,
            image: Some(image),
            from_cache: true,
            failed: false,
            error: None,
        }
    }

    /// Image freshly fetched and decoded.
    #[must_use]
    pub const fn fetched(locator: ImageLocator, image: Arc<DynamicImage>) -> Self {
        Self {
            locator,
            image: Some(image),
            from_cache: false,
            failed: false,
            error: None,
        }
    }

    /// Resolution failed.
    #[must_use]
    pub const fn failure(locator: ImageLocator, error: ResolveError) -> Self {
        Self {
            locator,
            image: None,
            from_cache: false,
            failed: true,
            error: Some(error),
        }
    }

    /// Returns where the image came from, or None on failure.
    #[must_use]
    pub fn source(&self) -> Option<ImageSource> {
        if self.failed {
            None
        } else if self.from_cache {
            Some(ImageSource::DiskCache)
        } else if self.locator.is_network() {
            Some(ImageSource::Network)
        } else {
            Some(ImageSource::Local)
        }
    }

    /// Image dimensions, if an image is present.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| (img.width(), img.height()))
    }
}

/// Immediate result of a `resolve` call.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Resolved inline; the outcome has already been delivered.
    Ready(Option<Arc<DynamicImage>>),
    /// Resolution continues in the background; the outcome arrives on the listener.
    Pending,
}

impl Resolution {
    /// Returns true if the result will only arrive on the listener.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns the inline image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        match self {
            Self::Ready(image) => image.as_ref(),
            Self::Pending => None,
        }
    }
}
