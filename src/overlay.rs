//! The light/dark overlay pair and proportional resizing.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{Error, Result};

/// Which overlay variant to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Light logo, for dark backgrounds.
    Light,
    /// Dark logo, for light backgrounds.
    Dark,
}

/// Light and dark overlay images of identical size.
#[derive(Debug, Clone)]
pub struct OverlayPair {
    light: RgbaImage,
    dark: RgbaImage,
}

impl OverlayPair {
    /// Pair two RGBA overlays.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OverlayMismatch`] if the dimensions differ.
    pub fn new(light: RgbaImage, dark: RgbaImage) -> Result<Self> {
        if light.dimensions() != dark.dimensions() {
            return Err(Error::OverlayMismatch {
                light_width: light.width(),
                light_height: light.height(),
                dark_width: dark.width(),
                dark_height: dark.height(),
            });
        }
        Ok(Self { light, dark })
    }

    /// Shared `(width, height)` of both overlays.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.light.dimensions()
    }

    /// The overlay for `variant`.
    #[must_use]
    pub fn get(&self, variant: Variant) -> &RgbaImage {
        match variant {
            Variant::Light => &self.light,
            Variant::Dark => &self.dark,
        }
    }
}

/// Size of the scaled overlay for a photo of `image_w` x `image_h`.
///
/// Width is `floor(min(image_w, image_h) * ratio)`; height follows the
/// overlay's aspect ratio, rounded down.
///
/// # Errors
///
/// Returns [`Error::GeometryDegenerate`] if either side comes out as zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn target_size(
    image_w: u32,
    image_h: u32,
    overlay_w: u32,
    overlay_h: u32,
    ratio: f64,
) -> Result<(u32, u32)> {
    if overlay_w == 0 || overlay_h == 0 {
        return Err(Error::GeometryDegenerate(format!(
            "overlay is {overlay_w}x{overlay_h}"
        )));
    }

    let min_dim = f64::from(image_w.min(image_h));
    let width = (min_dim * ratio).floor().max(0.0) as u32;
    let height = u32::try_from(u64::from(width) * u64::from(overlay_h) / u64::from(overlay_w))
        .map_err(|_| {
            Error::GeometryDegenerate(format!(
                "a {overlay_w}x{overlay_h} overlay scaled to width {width} is too tall"
            ))
        })?;

    if width == 0 || height == 0 {
        return Err(Error::GeometryDegenerate(format!(
            "ratio {ratio} scales a {overlay_w}x{overlay_h} overlay to {width}x{height} \
             on a {image_w}x{image_h} image"
        )));
    }
    Ok((width, height))
}

/// Resize an overlay with a cubic (Catmull-Rom) kernel.
///
/// All four channels go through the same filter so the alpha edge stays
/// as smooth as the color.
#[must_use]
pub fn resize_overlay(overlay: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if overlay.dimensions() == (width, height) {
        return overlay.clone();
    }
    imageops::resize(overlay, width, height, FilterType::CatmullRom)
}
