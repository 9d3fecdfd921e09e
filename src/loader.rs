//! Decoding of photographs and overlay images.
//!
//! Files are always read into memory first and decoded from bytes, so any
//! path the OS accepts (including non-ASCII names) works the same way.

use std::path::Path;

use image::{ImageFormat, RgbImage, RgbaImage};
use log::debug;

use crate::error::{Error, Result};
use crate::metadata::ImageMetadata;
use crate::overlay::OverlayPair;

/// A decoded photograph with the metadata needed to save it again.
#[derive(Debug, Clone)]
pub struct Photo {
    /// Opaque RGB pixels.
    pub pixels: RgbImage,
    /// Format-specific settings captured from the source file.
    pub metadata: ImageMetadata,
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn detect_format(path: &Path, bytes: &[u8]) -> Result<ImageFormat> {
    image::guess_format(bytes).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a photograph as opaque RGB together with its metadata.
///
/// # Errors
///
/// Returns [`Error::Read`] if the file cannot be read, [`Error::Decode`] if
/// it is not a decodable image, or [`Error::UnsupportedFormat`] if it is
/// neither JPEG nor PNG.
pub fn load_photo(path: &Path) -> Result<Photo> {
    let bytes = read_bytes(path)?;
    let format = detect_format(path, &bytes)?;
    let metadata = ImageMetadata::capture(format, &bytes)?;

    let pixels = image::load_from_memory_with_format(&bytes, format)
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();

    debug!(
        "Loaded {} ({}x{}, {format:?})",
        path.display(),
        pixels.width(),
        pixels.height()
    );
    Ok(Photo { pixels, metadata })
}

/// Load one overlay image, which must be a PNG with an alpha channel.
///
/// `slot` names the overlay ("light" or "dark") in error messages.
///
/// # Errors
///
/// Returns [`Error::OverlayNotPng`], [`Error::MissingAlpha`], or a read or
/// decode error.
pub fn load_overlay(path: &Path, slot: &'static str) -> Result<RgbaImage> {
    let bytes = read_bytes(path)?;
    let format = detect_format(path, &bytes)?;
    if format != ImageFormat::Png {
        return Err(Error::OverlayNotPng {
            slot,
            path: path.to_path_buf(),
            found: format!("{format:?}"),
        });
    }

    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(|source| {
        Error::Decode {
            path: path.to_path_buf(),
            source,
        }
    })?;
    if !decoded.color().has_alpha() {
        return Err(Error::MissingAlpha {
            slot,
            path: path.to_path_buf(),
        });
    }

    Ok(decoded.to_rgba8())
}

/// Load the light and dark overlays and check that they match in size.
///
/// # Errors
///
/// Returns the first overlay load error, or [`Error::OverlayMismatch`].
pub fn load_overlay_pair(light: &Path, dark: &Path) -> Result<OverlayPair> {
    let light = load_overlay(light, "light")?;
    let dark = load_overlay(dark, "dark")?;
    OverlayPair::new(light, dark)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, Rgba};
    use tempfile::TempDir;

    #[test]
    fn load_photo_reads_png_as_rgb() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        RgbaImage::from_pixel(4, 3, Rgba([9, 8, 7, 10]))
            .save(&path)
            .unwrap();

        let photo = load_photo(&path).unwrap();
        assert_eq!(photo.pixels.dimensions(), (4, 3));
        assert_eq!(photo.pixels.get_pixel(0, 0), &Rgb([9, 8, 7]));
        assert_eq!(photo.metadata.format(), ImageFormat::Png);
    }

    #[test]
    fn load_photo_reports_missing_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let missing = load_photo(&dir.path().join("nope.jpg")).unwrap_err();
        assert!(matches!(missing, Error::Read { .. }));

        let corrupt = dir.path().join("corrupt.jpg");
        std::fs::write(&corrupt, b"definitely not an image").unwrap();
        assert!(matches!(
            load_photo(&corrupt).unwrap_err(),
            Error::Decode { .. }
        ));
    }

    #[test]
    fn load_photo_rejects_formats_without_metadata_support() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.bmp");
        DynamicImage::ImageRgb8(RgbImage::new(2, 2))
            .save(&path)
            .unwrap();
        assert!(matches!(
            load_photo(&path).unwrap_err(),
            Error::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn overlay_requires_alpha() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("opaque.png");
        RgbImage::new(4, 4).save(&path).unwrap();

        let err = load_overlay(&path, "light").unwrap_err();
        assert!(matches!(err, Error::MissingAlpha { slot: "light", .. }));
    }

    #[test]
    fn overlay_requires_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.jpg");
        RgbImage::new(4, 4).save(&path).unwrap();

        let err = load_overlay(&path, "dark").unwrap_err();
        assert!(matches!(err, Error::OverlayNotPng { slot: "dark", .. }));
    }

    #[test]
    fn overlay_pair_rejects_mismatched_sizes() {
        let dir = TempDir::new().unwrap();
        let light = dir.path().join("light.png");
        let dark = dir.path().join("dark.png");
        RgbaImage::new(20, 10).save(&light).unwrap();
        RgbaImage::new(10, 10).save(&dark).unwrap();

        let err = load_overlay_pair(&light, &dark).unwrap_err();
        assert!(matches!(err, Error::OverlayMismatch { .. }));
    }
}
