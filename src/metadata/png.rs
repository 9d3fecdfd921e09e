//! PNG ancillary-chunk capture and re-emission.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use log::debug;

use crate::error::Result;

const SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Chunks that describe color or carry descriptive text and stay valid for an
/// 8-bit RGB re-encode. Layout-bound chunks (`PLTE`, `tRNS`, `sBIT`, ...) are
/// dropped because the output color type may differ from the source.
const KEPT_CHUNKS: [&[u8; 4]; 10] = [
    b"iCCP", b"sRGB", b"gAMA", b"cHRM", b"pHYs", b"tEXt", b"zTXt", b"iTXt", b"eXIf", b"tIME",
];

/// Ancillary chunks of a decoded PNG.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PngMetadata {
    chunks: Vec<Vec<u8>>,
}

impl PngMetadata {
    /// Collect the kept ancillary chunks of a PNG byte stream.
    ///
    /// Never fails; scanning stops at the first malformed chunk or at `IEND`.
    #[must_use]
    pub fn capture(bytes: &[u8]) -> Self {
        let chunks: Vec<Vec<u8>> = chunks(bytes)
            .into_iter()
            .filter(|(kind, _)| KEPT_CHUNKS.contains(kind))
            .map(|(_, raw)| raw.to_vec())
            .collect();
        debug!("PNG metadata: {} kept chunk(s)", chunks.len());
        Self { chunks }
    }

    /// Kept chunks as `(type, data)` pairs, in source order.
    pub fn chunks(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.chunks.iter().map(|raw| (&raw[4..8], &raw[8..raw.len() - 4]))
    }

    /// Data of the first kept chunk of type `kind`.
    #[must_use]
    pub fn chunk(&self, kind: &[u8; 4]) -> Option<&[u8]> {
        self.chunks()
            .find(|(k, _)| *k == kind.as_slice())
            .map(|(_, data)| data)
    }

    /// Encode `image` as RGB PNG with the kept chunks placed after `IHDR`.
    ///
    /// # Errors
    ///
    /// Returns an error if the PNG encoder fails.
    pub fn encode(&self, image: &RgbImage) -> Result<Vec<u8>> {
        let mut encoded = Vec::new();
        PngEncoder::new(&mut encoded).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(splice_chunks(&encoded, &self.chunks))
    }
}

/// Split a PNG stream into `(type, raw chunk)` pairs. The raw slice spans
/// length, type, data and CRC.
fn chunks(bytes: &[u8]) -> Vec<(&[u8; 4], &[u8])> {
    let mut out = Vec::new();
    if !bytes.starts_with(SIGNATURE) {
        return out;
    }

    let mut pos = SIGNATURE.len();
    while pos + 12 <= bytes.len() {
        let len = u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]]);
        let Ok(len) = usize::try_from(len) else {
            break;
        };
        let end = pos + 12 + len;
        if end > bytes.len() {
            break;
        }
        let Ok(kind) = <&[u8; 4]>::try_from(&bytes[pos + 4..pos + 8]) else {
            break;
        };
        out.push((kind, &bytes[pos..end]));
        pos = end;
        if kind == b"IEND" {
            break;
        }
    }
    out
}

/// Insert raw chunks directly after the `IHDR` chunk of an encoded PNG.
fn splice_chunks(encoded: &[u8], chunks_to_insert: &[Vec<u8>]) -> Vec<u8> {
    let Some(&(_, ihdr)) = chunks(encoded).first() else {
        return encoded.to_vec();
    };
    let at = SIGNATURE.len() + ihdr.len();

    let extra: usize = chunks_to_insert.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(encoded.len() + extra);
    out.extend_from_slice(&encoded[..at]);
    for chunk in chunks_to_insert {
        out.extend_from_slice(chunk);
    }
    out.extend_from_slice(&encoded[at..]);
    out
}
