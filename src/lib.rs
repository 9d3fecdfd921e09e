//! Batch-apply a logo watermark, choosing a light or dark variant per photo.
//!
//! For each photo the engine samples the brightness of the bottom-right
//! corner, picks the light logo for dark corners (mean below 0.4) and the
//! dark logo otherwise, scales it to a fraction of the photo's shorter side,
//! alpha-blends it at one of nine anchors and writes the result in the
//! source format with its metadata (EXIF, ICC, density, JPEG quality) intact.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::PathBuf;
//! use auto_watermark::{submit_job, Anchor, ProcessOptions, WatermarkJob};
//!
//! let job = WatermarkJob {
//!     images: vec![PathBuf::from("photos/beach.jpg")],
//!     light_overlay: PathBuf::from("logo-white.png"),
//!     dark_overlay: PathBuf::from("logo-black.png"),
//!     options: ProcessOptions {
//!         anchor: Anchor::BOTTOM_RIGHT,
//!         ..ProcessOptions::default()
//!     },
//! };
//! let report = submit_job(&job);
//! println!("{} written to photos/Modified", report.succeeded());
//! ```
//!
//! # In-memory use
//!
//! ```no_run
//! use std::path::Path;
//! use auto_watermark::{ProcessOptions, WatermarkEngine};
//!
//! let engine = WatermarkEngine::from_files(
//!     Path::new("logo-white.png"),
//!     Path::new("logo-black.png"),
//! )
//! .expect("failed to load overlays");
//! let mut img = image::open("photo.jpg").unwrap().to_rgb8();
//! engine.apply(&mut img, &ProcessOptions::default()).unwrap();
//! ```

#![deny(missing_docs)]

pub mod anchor;
pub mod blending;
mod engine;
pub mod error;
mod job;
pub mod loader;
pub mod metadata;
pub mod overlay;
pub mod selection;
pub mod writer;

pub use anchor::Anchor;
pub use engine::{
    collect_images, is_supported_image, Applied, ProcessOptions, ProcessResult, Status,
    WatermarkEngine, DEFAULT_RATIO,
};
pub use error::{Error, ErrorKind, Result};
pub use job::{submit_job, Report, WatermarkJob};
pub use metadata::ImageMetadata;
pub use overlay::{OverlayPair, Variant};
