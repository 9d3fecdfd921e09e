//! JPEG marker-segment capture and re-emission.

use image::codecs::jpeg::{JpegEncoder, PixelDensity, PixelDensityUnit};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use log::debug;

use crate::error::Result;

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const DQT: u8 = 0xDB;
const TEM: u8 = 0x01;
const RST0: u8 = 0xD0;
const RST7: u8 = 0xD7;
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const APP2: u8 = 0xE2;
const APP14: u8 = 0xEE;
const APP15: u8 = 0xEF;
const COM: u8 = 0xFE;

/// Quality used when the source carries no usable luma quantization table.
const FALLBACK_QUALITY: u8 = 90;

/// IJG standard luminance quantization table (ITU-T T.81 Annex K).
const STD_LUMA_QTABLE: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, //
    12, 12, 14, 19, 26, 58, 60, 55, //
    14, 13, 16, 24, 40, 57, 69, 56, //
    14, 17, 22, 29, 51, 87, 80, 62, //
    18, 22, 37, 56, 68, 109, 103, 77, //
    24, 35, 55, 64, 81, 104, 113, 92, //
    49, 64, 78, 87, 103, 121, 120, 101, //
    72, 92, 95, 98, 112, 100, 103, 99, //
];

/// Pixel density from a JFIF `APP0` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JfifDensity {
    /// 0 = aspect ratio only, 1 = dots per inch, 2 = dots per centimeter.
    pub unit: u8,
    /// Horizontal density.
    pub x: u16,
    /// Vertical density.
    pub y: u16,
}

impl From<JfifDensity> for PixelDensity {
    fn from(d: JfifDensity) -> Self {
        let unit = match d.unit {
            1 => PixelDensityUnit::Inches,
            2 => PixelDensityUnit::Centimeters,
            _ => PixelDensityUnit::PixelAspectRatio,
        };
        PixelDensity {
            density: (d.x, d.y),
            unit,
        }
    }
}

/// Settings and segments of a decoded JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegMetadata {
    quality: u8,
    density: Option<JfifDensity>,
    segments: Vec<Vec<u8>>,
}

impl JpegMetadata {
    /// Scan the header segments of a JPEG byte stream.
    ///
    /// Never fails: a truncated or odd header yields whatever was recognized
    /// before the problem, with [`FALLBACK_QUALITY`] if no luma table was seen.
    #[must_use]
    pub fn capture(bytes: &[u8]) -> Self {
        let mut quality = None;
        let mut density = None;
        let mut segments = Vec::new();

        for (marker, segment) in marker_segments(bytes) {
            let payload = &segment[4..];
            match marker {
                DQT => {
                    if let Some(luma) = luma_table(payload) {
                        quality = Some(estimate_quality(&luma));
                    }
                }
                APP0 if payload.starts_with(b"JFIF\0") => {
                    if payload.len() >= 12 {
                        density = Some(JfifDensity {
                            unit: payload[7],
                            x: u16::from_be_bytes([payload[8], payload[9]]),
                            y: u16::from_be_bytes([payload[10], payload[11]]),
                        });
                    }
                }
                // The Adobe transform flag describes the source's color
                // encoding; the encoder always writes YCbCr.
                APP14 if payload.starts_with(b"Adobe") => {
                    debug!("Dropping Adobe APP14 segment");
                }
                APP0..=APP15 | COM => segments.push(segment.to_vec()),
                _ => {}
            }
        }

        let meta = Self {
            quality: quality.unwrap_or(FALLBACK_QUALITY),
            density,
            segments,
        };
        debug!(
            "JPEG metadata: quality {}, density {:?}, {} kept segment(s)",
            meta.quality,
            meta.density,
            meta.segments.len()
        );
        meta
    }

    /// Estimated encoder quality (1-100).
    #[must_use]
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// JFIF pixel density, if the source had a JFIF header.
    #[must_use]
    pub fn density(&self) -> Option<JfifDensity> {
        self.density
    }

    /// Kept marker segments, each including its `FF xx` marker and length.
    pub fn segments(&self) -> impl Iterator<Item = &[u8]> {
        self.segments.iter().map(Vec::as_slice)
    }

    /// Raw EXIF payload (TIFF header onward) from the first `Exif` `APP1`.
    #[must_use]
    pub fn exif(&self) -> Option<&[u8]> {
        self.segments()
            .filter(|s| s[1] == APP1)
            .find_map(|s| s[4..].strip_prefix(b"Exif\0\0"))
    }

    /// ICC profile reassembled from its `APP2` chunks.
    #[must_use]
    pub fn icc_profile(&self) -> Option<Vec<u8>> {
        let mut chunks: Vec<(u8, &[u8])> = self
            .segments()
            .filter(|s| s[1] == APP2)
            .filter_map(|s| s[4..].strip_prefix(b"ICC_PROFILE\0"))
            .filter(|p| p.len() > 2)
            .map(|p| (p[0], &p[2..]))
            .collect();
        if chunks.is_empty() {
            return None;
        }
        chunks.sort_by_key(|&(seq, _)| seq);
        Some(chunks.into_iter().flat_map(|(_, data)| data).copied().collect())
    }

    /// Encode `image` at the captured quality and density, then re-insert the
    /// kept segments right after the encoder's own header.
    ///
    /// # Errors
    ///
    /// Returns an error if the JPEG encoder fails.
    pub fn encode(&self, image: &RgbImage) -> Result<Vec<u8>> {
        let mut encoded = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut encoded, self.quality);
        if let Some(density) = self.density {
            encoder.set_pixel_density(density.into());
        }
        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(splice_segments(&encoded, &self.segments))
    }
}

/// Split the header of a JPEG stream into `(marker, segment)` pairs, stopping
/// at start-of-scan. Each segment slice starts at its `0xFF` marker byte.
fn marker_segments(bytes: &[u8]) -> Vec<(u8, &[u8])> {
    let mut out = Vec::new();
    if bytes.len() < 2 || bytes[0] != 0xFF || bytes[1] != SOI {
        return out;
    }

    let mut pos = 2;
    while pos + 1 < bytes.len() {
        if bytes[pos] != 0xFF {
            break;
        }
        let marker = bytes[pos + 1];
        if marker == 0xFF {
            // fill byte
            pos += 1;
            continue;
        }
        if marker == SOS || marker == EOI {
            break;
        }
        if marker == TEM || (RST0..=RST7).contains(&marker) {
            pos += 2;
            continue;
        }
        if pos + 4 > bytes.len() {
            break;
        }
        let len = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));
        let end = pos + 2 + len;
        if len < 2 || end > bytes.len() {
            break;
        }
        out.push((marker, &bytes[pos..end]));
        pos = end;
    }
    out
}

/// Extract quantization table 0 from a DQT payload, if present.
fn luma_table(payload: &[u8]) -> Option<Vec<u16>> {
    let mut i = 0;
    while i < payload.len() {
        let precision = payload[i] >> 4;
        let id = payload[i] & 0x0F;
        i += 1;
        let size = if precision == 0 { 64 } else { 128 };
        let raw = payload.get(i..i + size)?;
        i += size;
        if id != 0 {
            continue;
        }
        let table = if precision == 0 {
            raw.iter().copied().map(u16::from).collect()
        } else {
            raw.chunks_exact(2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .collect()
        };
        return Some(table);
    }
    None
}

/// The IJG-scaled standard luma table for `quality`.
#[allow(clippy::cast_possible_truncation)]
fn scaled_luma_table(quality: u8) -> [u16; 64] {
    let q = u32::from(quality.clamp(1, 100));
    let scale = if q < 50 { 5000 / q } else { 200 - q * 2 };
    STD_LUMA_QTABLE.map(|v| ((u32::from(v) * scale + 50) / 100).clamp(1, 255) as u16)
}

/// Find the quality whose scaled standard table is closest to `luma`.
///
/// Values are compared sorted, so zigzag and natural order match equally.
/// Ties resolve to the lowest quality, which keeps the estimate stable across
/// re-encodes.
fn estimate_quality(luma: &[u16]) -> u8 {
    let mut actual = luma.to_vec();
    actual.sort_unstable();

    let mut best = (u32::MAX, FALLBACK_QUALITY);
    for quality in 1..=100u8 {
        let mut expected = scaled_luma_table(quality);
        expected.sort_unstable();
        let distance: u32 = actual
            .iter()
            .zip(expected.iter())
            .map(|(a, e)| u32::from(a.abs_diff(*e)))
            .sum();
        if distance < best.0 {
            best = (distance, quality);
        }
    }
    best.1
}

/// Insert `segments` after SOI and the encoder's JFIF `APP0`, if any.
fn splice_segments(encoded: &[u8], segments: &[Vec<u8>]) -> Vec<u8> {
    let mut at = 2.min(encoded.len());
    if encoded.len() >= 6 && encoded[2] == 0xFF && encoded[3] == APP0 {
        at += 2 + usize::from(u16::from_be_bytes([encoded[4], encoded[5]]));
        at = at.min(encoded.len());
    }

    let extra: usize = segments.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(encoded.len() + extra);
    out.extend_from_slice(&encoded[..at]);
    for segment in segments {
        out.extend_from_slice(segment);
    }
    out.extend_from_slice(&encoded[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_segment(marker: u8, payload: &[u8]) -> Vec<u8> {
        let len = u16::try_from(payload.len() + 2).unwrap();
        let mut seg = vec![0xFF, marker];
        seg.extend_from_slice(&len.to_be_bytes());
        seg.extend_from_slice(payload);
        seg
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_gradient(quality: u8, density: Option<PixelDensity>) -> Vec<u8> {
        let img = RgbImage::from_fn(32, 24, |x, y| {
            image::Rgb([(x * 8) as u8, (y * 10) as u8, 128])
        });
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        if let Some(d) = density {
            encoder.set_pixel_density(d);
        }
        encoder
            .write_image(img.as_raw(), 32, 24, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    #[test]
    fn estimate_recovers_every_standard_quality() {
        for quality in 1..=100u8 {
            assert_eq!(estimate_quality(&scaled_luma_table(quality)), quality);
        }
    }

    #[test]
    fn capture_reads_quality_and_density() {
        let bytes = encode_gradient(
            70,
            Some(PixelDensity {
                density: (300, 300),
                unit: PixelDensityUnit::Inches,
            }),
        );
        let meta = JpegMetadata::capture(&bytes);
        assert_eq!(meta.quality(), 70);
        assert_eq!(
            meta.density(),
            Some(JfifDensity {
                unit: 1,
                x: 300,
                y: 300
            })
        );
    }

    #[test]
    fn splice_keeps_exif_and_comment_segments() {
        let mut exif = b"Exif\0\0".to_vec();
        exif.extend_from_slice(b"II*\0fake-tiff");
        let app1 = app_segment(APP1, &exif);
        let com = app_segment(COM, b"shot on film");

        let plain = encode_gradient(80, None);
        let tagged = splice_segments(&plain, &[app1.clone(), com.clone()]);
        assert!(image::load_from_memory(&tagged).is_ok());

        let meta = JpegMetadata::capture(&tagged);
        let kept: Vec<&[u8]> = meta.segments().collect();
        assert_eq!(kept, vec![app1.as_slice(), com.as_slice()]);
        assert_eq!(meta.exif(), Some(&b"II*\0fake-tiff"[..]));
    }

    #[test]
    fn icc_profile_reassembles_chunks_in_sequence_order() {
        let mut second = b"ICC_PROFILE\0".to_vec();
        second.extend_from_slice(&[2, 2]);
        second.extend_from_slice(b"world");
        let mut first = b"ICC_PROFILE\0".to_vec();
        first.extend_from_slice(&[1, 2]);
        first.extend_from_slice(b"hello ");

        let meta = JpegMetadata {
            quality: 90,
            density: None,
            segments: vec![app_segment(APP2, &second), app_segment(APP2, &first)],
        };
        assert_eq!(meta.icc_profile().unwrap(), b"hello world");
    }

    #[test]
    fn encode_round_trips_settings() {
        let mut source = encode_gradient(
            60,
            Some(PixelDensity {
                density: (72, 72),
                unit: PixelDensityUnit::Inches,
            }),
        );
        source = splice_segments(&source, &[app_segment(COM, b"keep me")]);
        let meta = JpegMetadata::capture(&source);

        let decoded = image::load_from_memory(&source).unwrap().to_rgb8();
        let reencoded = meta.encode(&decoded).unwrap();
        assert_eq!(JpegMetadata::capture(&reencoded), meta);
    }

    #[test]
    fn adobe_transform_segment_is_not_carried_over() {
        let red = RgbImage::from_pixel(16, 16, image::Rgb([200, 40, 40]));
        let mut plain = Vec::new();
        JpegEncoder::new_with_quality(&mut plain, 95)
            .write_image(red.as_raw(), 16, 16, ExtendedColorType::Rgb8)
            .unwrap();

        // "Adobe", version 100, flags0, flags1, transform 0 (RGB).
        let adobe = app_segment(APP14, b"Adobe\x00\x64\x00\x00\x00\x00\x00");
        let com = app_segment(COM, b"kept");
        let source = splice_segments(&plain, &[adobe, com.clone()]);

        let meta = JpegMetadata::capture(&source);
        let kept: Vec<&[u8]> = meta.segments().collect();
        assert_eq!(kept, vec![com.as_slice()]);

        let reencoded = meta.encode(&red).unwrap();
        let decoded = image::load_from_memory(&reencoded).unwrap().to_rgb8();
        let px = decoded.get_pixel(8, 8);
        for (got, want) in px.0.iter().zip([200u8, 40, 40]) {
            assert!(got.abs_diff(want) <= 4, "decoded {px:?}");
        }
    }

    #[test]
    fn capture_tolerates_garbage() {
        let meta = JpegMetadata::capture(b"not a jpeg at all");
        assert_eq!(meta.quality(), FALLBACK_QUALITY);
        assert!(meta.density().is_none());
        assert_eq!(meta.segments().count(), 0);

        let truncated = JpegMetadata::capture(&[0xFF, SOI, 0xFF, DQT, 0x00]);
        assert_eq!(truncated.quality(), FALLBACK_QUALITY);
    }
}
