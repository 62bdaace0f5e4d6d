//! Shared test utilities for the phototable test suite.
//!
//! Synthetic images (encoded and decoded), a scripted [`ImageSupplier`], and
//! small time helpers.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let supplier = ScriptedSupplier::new(vec![Err(retryable()), Ok((40, 30))]);
//! let image = supplier.next(500, 400).unwrap_err();
//! assert!(image.is_retryable());
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::imaging::{DecodeError, DecodedImage};
use crate::source::{ImageSupplier, LoadError};

// =========================================================================
// Time
// =========================================================================

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

// =========================================================================
// Images
// =========================================================================

/// Encode an RGBA buffer as PNG bytes.
pub fn encode_png(pixels: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            pixels.as_raw(),
            pixels.width(),
            pixels.height(),
            ExtendedColorType::Rgba8,
        )
        .unwrap();
    bytes
}

/// JPEG bytes of a flat image carrying an EXIF orientation tag (1..=8).
///
/// The APP1 segment holds a big-endian TIFF header and a single-entry IFD,
/// spliced in right after the SOI marker.
pub fn jpeg_with_orientation(width: u32, height: u32, tag: u8) -> Vec<u8> {
    let pixels = RgbImage::from_pixel(width, height, Rgb([90, 160, 30]));
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, 90)
        .write_image(pixels.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();

    let mut payload = b"Exif\0\0MM\0\x2a\0\0\0\x08".to_vec();
    payload.extend_from_slice(&[0, 1]); // one entry
    payload.extend_from_slice(&[0x01, 0x12, 0, 3, 0, 0, 0, 1, 0, tag, 0, 0]);
    payload.extend_from_slice(&[0, 0, 0, 0]); // no next IFD
    let length = (payload.len() + 2) as u16;

    let mut bytes = encoded[..2].to_vec();
    bytes.extend_from_slice(&[0xff, 0xe1]);
    bytes.extend_from_slice(&length.to_be_bytes());
    bytes.extend_from_slice(&payload);
    bytes.extend_from_slice(&encoded[2..]);
    bytes
}

/// PNG bytes of a horizontal red-to-blue gradient.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let pixels = RgbaImage::from_fn(width, height, |x, _| {
        let t = (x * 255 / width.max(1)) as u8;
        Rgba([255 - t, 0, t, 255])
    });
    encode_png(&pixels)
}

/// An already-decoded opaque gray bitmap.
pub fn decoded(width: u32, height: u32) -> DecodedImage {
    DecodedImage::new(RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255])))
}

/// A failure the table retries.
pub fn retryable() -> LoadError {
    LoadError::Decode(DecodeError::Decode("truncated stream".into()))
}

// =========================================================================
// Scripted supplier
// =========================================================================

/// An [`ImageSupplier`] that plays back a fixed script.
///
/// Each call pops the next entry: `Ok((w, h))` yields a [`decoded`] bitmap of
/// that size, `Err` is returned as-is. Once the script runs out every call
/// returns `SupplyExhausted`.
pub struct ScriptedSupplier {
    script: Mutex<VecDeque<Result<(u32, u32), LoadError>>>,
    calls: AtomicUsize,
}

impl ScriptedSupplier {
    pub fn new(script: Vec<Result<(u32, u32), LoadError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// `count` successful loads of `width x height`.
    pub fn repeating(count: usize, width: u32, height: u32) -> Self {
        Self::new((0..count).map(|_| Ok((width, height))).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageSupplier for ScriptedSupplier {
    fn next(&self, _long: u32, _short: u32) -> Result<DecodedImage, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Ok((width, height))) => Ok(decoded(width, height)),
            Some(Err(e)) => Err(e),
            None => Err(LoadError::SupplyExhausted),
        }
    }
}
