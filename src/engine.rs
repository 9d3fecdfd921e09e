//! Core watermark compositing engine.

use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{debug, info, warn};

use crate::anchor::Anchor;
use crate::blending::{self, Placement};
use crate::error::{Error, ErrorKind, Result};
use crate::loader;
use crate::overlay::{self, OverlayPair, Variant};
use crate::selection;
use crate::writer;

/// Default overlay width as a fraction of the photo's shorter side.
pub const DEFAULT_RATIO: f64 = 0.18;

/// Options controlling how overlays are applied.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Overlay width as a fraction of `min(width, height)`, in `(0, 1]`.
    pub ratio: f64,
    /// Where the overlay goes.
    pub anchor: Anchor,
    /// Replace the source file instead of writing to `Modified/`.
    pub overwrite: bool,
    /// Spread images over a thread pool (only with the `cli` feature).
    pub parallel: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_RATIO,
            anchor: Anchor::default(),
            overwrite: false,
            parallel: true,
        }
    }
}

impl ProcessOptions {
    /// Check that the options describe a usable job.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRatio`] unless `0 < ratio <= 1`.
    pub fn validate(&self) -> Result<()> {
        if self.ratio > 0.0 && self.ratio <= 1.0 {
            Ok(())
        } else {
            Err(Error::InvalidRatio(self.ratio))
        }
    }
}

/// What [`WatermarkEngine::apply`] did to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    /// Variant chosen from the sampled brightness.
    pub variant: Variant,
    /// Scaled overlay `(width, height)`.
    pub overlay_size: (u32, u32),
    /// Where the overlay was blended.
    pub placement: Placement,
}

/// Outcome status of one input image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Watermarked and written to the contained path.
    Success(PathBuf),
    /// Not processed (unreadable input or no room for the overlay).
    Skipped(String),
    /// Processed but could not be written.
    Failed(String),
}

/// Result of processing a single image file.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Path of the input file.
    pub path: PathBuf,
    /// What happened to it.
    pub status: Status,
}

impl ProcessResult {
    fn from_error(path: &Path, err: &Error) -> Self {
        let reason = err.to_string();
        let status = match err.kind() {
            ErrorKind::IoFailure => Status::Failed(reason),
            _ => Status::Skipped(reason),
        };
        Self {
            path: path.to_path_buf(),
            status,
        }
    }

    /// Whether the image was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, Status::Success(_))
    }
}

/// The watermark engine holding the loaded overlay pair.
///
/// Create once per batch and reuse for every image. The engine is immutable
/// while processing, so it can be shared across threads.
#[derive(Debug, Clone)]
pub struct WatermarkEngine {
    overlays: OverlayPair,
}

impl WatermarkEngine {
    /// Create an engine from an already loaded overlay pair.
    #[must_use]
    pub fn new(overlays: OverlayPair) -> Self {
        Self { overlays }
    }

    /// Load the light and dark overlays from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if either overlay cannot be loaded, lacks alpha, is
    /// not a PNG, or the two differ in size.
    pub fn from_files(light: &Path, dark: &Path) -> Result<Self> {
        let overlays = loader::load_overlay_pair(light, dark)?;
        let (w, h) = overlays.dimensions();
        debug!("Loaded overlay pair ({w}x{h})");
        Ok(Self::new(overlays))
    }

    /// The overlay pair in use.
    #[must_use]
    pub fn overlays(&self) -> &OverlayPair {
        &self.overlays
    }

    /// Apply the watermark to an image in place.
    ///
    /// Brightness is sampled before the image is modified; only the
    /// placement rectangle changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GeometryDegenerate`] if the scaled overlay or its
    /// destination rectangle has no area. The image is untouched in that case.
    pub fn apply(&self, image: &mut RgbImage, opts: &ProcessOptions) -> Result<Applied> {
        let (img_w, img_h) = image.dimensions();
        let (logo_w, logo_h) = self.overlays.dimensions();

        let variant = selection::select_variant(image, logo_w, logo_h);
        let (width, height) = overlay::target_size(img_w, img_h, logo_w, logo_h, opts.ratio)?;
        let placement = blending::placement(opts.anchor, img_w, img_h, width, height)?;

        let scaled = overlay::resize_overlay(self.overlays.get(variant), width, height);
        blending::alpha_blend(image, &scaled, &placement);

        debug!(
            "{variant:?} overlay {width}x{height} at {} -> ({}, {})",
            opts.anchor, placement.x, placement.y
        );
        Ok(Applied {
            variant,
            overlay_size: (width, height),
            placement,
        })
    }

    /// Process a single image file: load, apply, save.
    ///
    /// Never fails as a whole; problems end up in the returned status.
    #[must_use]
    pub fn process_file(&self, input: &Path, opts: &ProcessOptions) -> ProcessResult {
        let outcome = loader::load_photo(input).and_then(|mut photo| {
            self.apply(&mut photo.pixels, opts)?;
            writer::save(&photo.pixels, &photo.metadata, input, opts.overwrite)
        });

        match outcome {
            Ok(output) => {
                info!("{} -> {}", input.display(), output.display());
                ProcessResult {
                    path: input.to_path_buf(),
                    status: Status::Success(output),
                }
            }
            Err(e) => {
                warn!("{}: {e}", input.display());
                ProcessResult::from_error(input, &e)
            }
        }
    }

    /// Process every image in order, returning one result per input.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon)
    /// and `opts.parallel` is set. Result order always matches `inputs`.
    #[must_use]
    pub fn process_all(&self, inputs: &[PathBuf], opts: &ProcessOptions) -> Vec<ProcessResult> {
        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            if opts.parallel {
                return inputs
                    .par_iter()
                    .map(|input| self.process_file(input, opts))
                    .collect();
            }
        }

        inputs
            .iter()
            .map(|input| self.process_file(input, opts))
            .collect()
    }
}

/// Check if a file has a supported photo extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png"),
        None => false,
    }
}

/// Expand the given paths into the list of photos to process.
///
/// Directories contribute their supported files (non-recursive, sorted by
/// name); files are kept in the given order if supported. Anything else,
/// including paths that cannot be read, is dropped with a warning.
#[must_use]
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = match std::fs::read_dir(path) {
                Ok(rd) => rd
                    .filter_map(std::result::Result::ok)
                    .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                    .map(|e| e.path())
                    .filter(|p| is_supported_image(p))
                    .collect(),
                Err(e) => {
                    warn!("Failed to read directory {}: {e}", path.display());
                    continue;
                }
            };
            found.sort();
            images.extend(found);
        } else if is_supported_image(path) {
            images.push(path.clone());
        } else {
            warn!("Ignoring unsupported input {}", path.display());
        }
    }
    images
}
