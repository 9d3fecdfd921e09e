//! Error types for the auto-watermark crate.

use std::path::PathBuf;

/// Errors that can occur while loading, compositing, or saving images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The light and dark overlays do not share the same dimensions.
    #[error(
        "light and dark overlays differ in size \
         ({light_width}x{light_height} vs {dark_width}x{dark_height})"
    )]
    OverlayMismatch {
        /// Light overlay width in pixels.
        light_width: u32,
        /// Light overlay height in pixels.
        light_height: u32,
        /// Dark overlay width in pixels.
        dark_width: u32,
        /// Dark overlay height in pixels.
        dark_height: u32,
    },

    /// An overlay image decoded without an alpha channel.
    #[error("{slot} overlay {} has no alpha channel", .path.display())]
    MissingAlpha {
        /// Which overlay slot ("light" or "dark").
        slot: &'static str,
        /// Path of the overlay file.
        path: PathBuf,
    },

    /// An overlay file is not a PNG.
    #[error("{slot} overlay {} must be a PNG, found {found}", .path.display())]
    OverlayNotPng {
        /// Which overlay slot ("light" or "dark").
        slot: &'static str,
        /// Path of the overlay file.
        path: PathBuf,
        /// Detected format.
        found: String,
    },

    /// A file could not be read from disk.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A file's bytes could not be decoded as an image.
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        /// Path of the undecodable file.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// A computed overlay size or destination rectangle has no area.
    #[error("degenerate geometry: {0}")]
    GeometryDegenerate(String),

    /// The size ratio lies outside `(0, 1]`.
    #[error("size ratio must be within (0, 1], got {0}")]
    InvalidRatio(f64),

    /// An anchor could not be parsed or is out of range.
    #[error("invalid anchor: {0}")]
    InvalidAnchor(String),

    /// An I/O error occurred while writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred while encoding an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// Coarse classification of [`Error`] that decides how a batch reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Overlay pair unusable; the whole batch aborts.
    OverlayPrecondition,
    /// Job parameters are invalid; the whole batch aborts.
    InvalidJob,
    /// An input could not be read or decoded; the image is skipped.
    DecodeFailure,
    /// The overlay would have no visible area; the image is skipped.
    GeometryDegenerate,
    /// Output could not be written; the image fails.
    IoFailure,
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OverlayMismatch { .. }
            | Self::MissingAlpha { .. }
            | Self::OverlayNotPng { .. } => ErrorKind::OverlayPrecondition,
            Self::InvalidRatio(_) | Self::InvalidAnchor(_) => ErrorKind::InvalidJob,
            Self::Read { .. } | Self::Decode { .. } | Self::UnsupportedFormat(_) => {
                ErrorKind::DecodeFailure
            }
            Self::GeometryDegenerate(_) => ErrorKind::GeometryDegenerate,
            Self::Io(_) | Self::Image(_) => ErrorKind::IoFailure,
        }
    }

    /// Whether this error stops the whole batch rather than a single image.
    #[must_use]
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::OverlayPrecondition | ErrorKind::InvalidJob
        )
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
