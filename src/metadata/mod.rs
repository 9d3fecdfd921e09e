//! Format-specific metadata captured at decode time and reapplied on save.
//!
//! Each variant is an opaque capability: the bytes and settings it holds are
//! round-tripped without interpretation, so a re-saved photo keeps its EXIF,
//! ICC profile, density and (for JPEG) its compression quality.

pub mod jpeg;
pub mod png;

use image::{ImageFormat, RgbImage};

use crate::error::{Error, Result};

pub use jpeg::{JfifDensity, JpegMetadata};
pub use png::PngMetadata;

/// Metadata of a decoded photograph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageMetadata {
    /// JPEG quality, density and marker segments.
    Jpeg(JpegMetadata),
    /// PNG ancillary chunks.
    Png(PngMetadata),
}

impl ImageMetadata {
    /// Capture metadata from the raw bytes of a file in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for anything other than JPEG or PNG.
    pub fn capture(format: ImageFormat, bytes: &[u8]) -> Result<Self> {
        match format {
            ImageFormat::Jpeg => Ok(Self::Jpeg(JpegMetadata::capture(bytes))),
            ImageFormat::Png => Ok(Self::Png(PngMetadata::capture(bytes))),
            other => Err(Error::UnsupportedFormat(format!("{other:?}"))),
        }
    }

    /// The container format this metadata belongs to.
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        match self {
            Self::Jpeg(_) => ImageFormat::Jpeg,
            Self::Png(_) => ImageFormat::Png,
        }
    }

    /// Encode `image` in this metadata's format with the captured settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if the encoder fails.
    pub fn encode(&self, image: &RgbImage) -> Result<Vec<u8>> {
        match self {
            Self::Jpeg(meta) => meta.encode(image),
            Self::Png(meta) => meta.encode(image),
        }
    }
}
