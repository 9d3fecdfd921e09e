//! Brightness sampling and light/dark variant selection.
//!
//! The sample is always the bottom-right block of the photo, sized to the
//! overlay's *unscaled* dimensions, whatever anchor the overlay is later
//! placed at.

use image::RgbImage;

use crate::overlay::Variant;

/// Mean brightness below which the light overlay is chosen.
pub const BRIGHTNESS_THRESHOLD: f64 = 0.4;

/// Mean of the R, G and B channels over a region, normalized to `[0, 1]`.
///
/// Returns `None` for an empty region.
#[allow(clippy::cast_precision_loss)]
fn region_mean(img: &RgbImage, x: u32, y: u32, w: u32, h: u32) -> Option<f64> {
    if w == 0 || h == 0 {
        return None;
    }

    let mut sum = 0u64;
    for dy in 0..h {
        for dx in 0..w {
            let px = img.get_pixel(x + dx, y + dy);
            sum += u64::from(px[0]) + u64::from(px[1]) + u64::from(px[2]);
        }
    }
    let count = u64::from(w) * u64::from(h) * 3;
    Some(sum as f64 / count as f64 / 255.0)
}

/// Mean brightness of the bottom-right `sample_w` x `sample_h` block,
/// clamped to the image bounds.
#[must_use]
pub fn sample_brightness(image: &RgbImage, sample_w: u32, sample_h: u32) -> Option<f64> {
    let w = sample_w.min(image.width());
    let h = sample_h.min(image.height());
    region_mean(image, image.width() - w, image.height() - h, w, h)
}

/// Pick the overlay variant that contrasts with the sampled region.
///
/// Strictly below [`BRIGHTNESS_THRESHOLD`] picks [`Variant::Light`]; anything
/// else, including an empty sample, picks [`Variant::Dark`].
#[must_use]
pub fn select_variant(image: &RgbImage, overlay_w: u32, overlay_h: u32) -> Variant {
    match sample_brightness(image, overlay_w, overlay_h) {
        Some(mean) if mean < BRIGHTNESS_THRESHOLD => Variant::Light,
        _ => Variant::Dark,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gray(w: u32, h: u32, v: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([v, v, v]))
    }

    #[test]
    fn threshold_boundaries() {
        // 99/255 ~ 0.388, 105/255 ~ 0.412, 102/255 == 0.4
        assert_eq!(select_variant(&gray(50, 50, 99), 10, 10), Variant::Light);
        assert_eq!(select_variant(&gray(50, 50, 105), 10, 10), Variant::Dark);
        assert_eq!(select_variant(&gray(50, 50, 102), 10, 10), Variant::Dark);
    }

    #[test]
    fn samples_bottom_right_only() {
        let mut img = gray(100, 100, 255);
        for y in 80..100 {
            for x in 70..100 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        assert_eq!(select_variant(&img, 30, 20), Variant::Light);
        // A larger sample reaches into the white area.
        assert_eq!(select_variant(&img, 60, 60), Variant::Dark);
    }

    #[test]
    fn channels_weigh_equally() {
        // (255 + 0 + 0) / 3 / 255 = 0.333
        let img = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let mean = sample_brightness(&img, 5, 5).unwrap();
        assert!((mean - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(select_variant(&img, 5, 5), Variant::Light);
    }

    #[test]
    fn sample_clamps_to_small_images() {
        let img = gray(4, 3, 20);
        let mean = sample_brightness(&img, 200, 100).unwrap();
        assert!((mean - 20.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn empty_sample_defaults_to_dark() {
        let img = gray(0, 0, 0);
        assert!(sample_brightness(&img, 10, 10).is_none());
        assert_eq!(select_variant(&img, 10, 10), Variant::Dark);
        assert_eq!(select_variant(&gray(10, 10, 0), 0, 5), Variant::Dark);
    }
}
