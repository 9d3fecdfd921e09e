//! Overlay placement and forward alpha blending.
//!
//! Each covered pixel becomes
//! `result = dest * (1 - alpha) + overlay * alpha`
//! with `alpha` read per pixel from the overlay's alpha channel.

use image::{RgbImage, RgbaImage};

use crate::anchor::Anchor;
use crate::error::{Error, Result};

/// Where an overlay lands on a photo after clamping to the photo bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Left edge on the photo.
    pub x: u32,
    /// Top edge on the photo.
    pub y: u32,
    /// Visible width.
    pub width: u32,
    /// Visible height.
    pub height: u32,
    /// Column of the overlay that lands on `x`.
    pub overlay_x: u32,
    /// Row of the overlay that lands on `y`.
    pub overlay_y: u32,
}

/// Center point of an overlay at `anchor`, in photo coordinates.
///
/// Corners and edges keep the overlay flush with the photo border; the
/// middle row or column centers it on the photo.
#[must_use]
pub fn anchor_center(
    anchor: Anchor,
    image_w: u32,
    image_h: u32,
    overlay_w: u32,
    overlay_h: u32,
) -> (f64, f64) {
    let axis = |slot: u8, image: u32, overlay: u32| {
        let (image, overlay) = (f64::from(image), f64::from(overlay));
        match slot {
            0 => overlay / 2.0,
            1 => image / 2.0,
            _ => image - overlay / 2.0,
        }
    };
    (
        axis(anchor.col(), image_w, overlay_w),
        axis(anchor.row(), image_h, overlay_h),
    )
}

/// Compute the destination rectangle for an overlay at `anchor`.
///
/// The rectangle starts at `round(center - size / 2)` and is clamped to the
/// photo.
///
/// # Errors
///
/// Returns [`Error::GeometryDegenerate`] if nothing of the overlay remains
/// on the photo.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn placement(
    anchor: Anchor,
    image_w: u32,
    image_h: u32,
    overlay_w: u32,
    overlay_h: u32,
) -> Result<Placement> {
    let (cx, cy) = anchor_center(anchor, image_w, image_h, overlay_w, overlay_h);
    let left = (cx - f64::from(overlay_w) / 2.0).round() as i64;
    let top = (cy - f64::from(overlay_h) / 2.0).round() as i64;

    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + i64::from(overlay_w)).min(i64::from(image_w));
    let y1 = (top + i64::from(overlay_h)).min(i64::from(image_h));

    if x1 <= x0 || y1 <= y0 {
        return Err(Error::GeometryDegenerate(format!(
            "{overlay_w}x{overlay_h} overlay at {anchor} leaves no visible area \
             on a {image_w}x{image_h} image"
        )));
    }

    // All values are within [0, u32::MAX] after clamping.
    Ok(Placement {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
        overlay_x: (x0 - left) as u32,
        overlay_y: (y0 - top) as u32,
    })
}

/// Blend `overlay` onto `image` inside `placement`, in place.
///
/// Pixels outside the placement rectangle are never touched, and fully
/// transparent overlay pixels leave the destination unchanged.
pub fn alpha_blend(image: &mut RgbImage, overlay: &RgbaImage, placement: &Placement) {
    for dy in 0..placement.height {
        for dx in 0..placement.width {
            let src = overlay.get_pixel(placement.overlay_x + dx, placement.overlay_y + dy);
            if src[3] == 0 {
                continue;
            }
            let alpha = f32::from(src[3]) / 255.0;
            let inv_alpha = 1.0 - alpha;

            let px = image.get_pixel_mut(placement.x + dx, placement.y + dy);
            for ch in 0..3 {
                let blended = f32::from(px[ch]) * inv_alpha + f32::from(src[ch]) * alpha;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    px[ch] = blended.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
}
