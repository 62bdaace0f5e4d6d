//! Image decoder trait and shared types.
//!
//! The [`ImageDecoder`] trait defines the two operations every decoder must
//! support: identify (bounds only, no pixel buffer) and decode (subsample,
//! scale, orientation-correct).
//!
//! The production implementation is
//! [`RustDecoder`](super::rust_backend::RustDecoder) on top of the `image`
//! crate. Tests swap in a mock that records calls.

use super::params::DecodeParams;
use image::RgbaImage;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not determine image bounds: {0}")]
    Bounds(String),
    #[error("Decoding failed: {0}")]
    Decode(String),
    #[error("Decoded image has zero area")]
    ZeroArea,
    #[error("Unsupported orientation: {0} degrees")]
    Orientation(u32),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A decoded, downsampled, upright bitmap.
///
/// The pixel buffer is owned exclusively; dropping the value releases it.
pub struct DecodedImage {
    pixels: RgbaImage,
}

impl DecodedImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Trait for image decoders.
///
/// Implementations must be `Sync`: the façade shares one decoder across the
/// worker pool.
pub trait ImageDecoder: Sync + Send {
    /// Read image bounds without allocating a pixel buffer.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, DecodeError>;

    /// Decode into the target box described by `params`.
    fn decode(&self, bytes: &[u8], params: &DecodeParams) -> Result<DecodedImage, DecodeError>;
}
