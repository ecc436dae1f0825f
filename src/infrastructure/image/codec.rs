//! Image decoding and suffix-driven encoding.

use std::borrow::Cow;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use image::{DynamicImage, ImageError, ImageFormat, ImageReader, ImageResult, Limits};

/// Default decoder allocation ceiling (512 MiB).
pub const DEFAULT_MAX_ALLOC: u64 = 512 * 1024 * 1024;

/// Allocation and dimension ceilings applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum bytes the decoder may allocate.
    pub max_alloc: u64,
    /// Maximum width and height in pixels.
    pub max_dimension: Option<u32>,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_alloc: DEFAULT_MAX_ALLOC,
            max_dimension: None,
        }
    }
}

/// Decodes raw bytes into rasters and encodes rasters by file suffix.
#[derive(Debug, Clone, Default)]
pub struct ImageCodec {
    limits: DecodeLimits,
}

impl ImageCodec {
    /// Creates a codec with the given decode limits.
    #[must_use]
    pub const fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    /// Decodes `bytes`, guessing the format from content.
    ///
    /// # Errors
    /// Returns error if the format is unknown, the data is corrupt, or a
    /// limit is exceeded (`ImageError::Limits`).
    pub fn decode(&self, bytes: &[u8]) -> ImageResult<DynamicImage> {
        let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        reader.limits(self.image_limits());
        reader.decode()
    }

    /// Resolves a writable format from the extension of `path`.
    #[must_use]
    pub fn format_for_path(path: &Path) -> Option<ImageFormat> {
        ImageFormat::from_path(path)
            .ok()
            .filter(ImageFormat::writing_enabled)
    }

    /// Encodes `image` into `writer` using `format`.
    ///
    /// # Errors
    /// Returns error if the encoder rejects the image or the write fails.
    pub fn encode<W: Write + Seek>(
        image: &DynamicImage,
        writer: &mut W,
        format: ImageFormat,
    ) -> ImageResult<()> {
        let image: Cow<'_, DynamicImage> =
            if format == ImageFormat::Jpeg && image.color().has_alpha() {
                Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
            } else {
                Cow::Borrowed(image)
            };
        image.write_to(writer, format)
    }

    /// Returns true if `err` was raised by a decoder limit.
    #[must_use]
    pub const fn is_limit_error(err: &ImageError) -> bool {
        matches!(err, ImageError::Limits(_))
    }

    fn image_limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_alloc = Some(self.limits.max_alloc);
        limits.max_image_width = self.limits.max_dimension;
        limits.max_image_height = self.limits.max_dimension;
        limits
    }
}
