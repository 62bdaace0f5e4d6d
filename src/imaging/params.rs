//! Parameter types for decode operations.
//!
//! These structs describe *what* the decoder should produce, not *how*. The
//! [`source`](crate::source) façade builds them from the table's current
//! target box and the provider's orientation tag, then hands them to an
//! [`ImageDecoder`](super::ImageDecoder).
//!
//! ## Types
//!
//! - [`Orientation`]: clockwise rotation tag of the stored pixels, normalized to `[0, 360)`.
//! - [`DecodeParams`]: target bounding box (long side, short side) plus orientation.

/// Clockwise rotation, in degrees, recorded for the stored pixels.
///
/// The decoder undoes it by rotating the bitmap by the negative of this
/// value. Construction normalizes any integer into `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation(u32);

impl Orientation {
    pub fn new(degrees: i32) -> Self {
        Self(degrees.rem_euclid(360) as u32)
    }

    pub fn degrees(self) -> u32 {
        self.0
    }

    pub fn is_upright(self) -> bool {
        self.0 == 0
    }
}

/// EXIF orientation names the rotation that *displays* the image upright,
/// which is the negative of the stored rotation. Mirrored variants keep only
/// their rotation part.
impl From<image::metadata::Orientation> for Orientation {
    fn from(exif: image::metadata::Orientation) -> Self {
        use image::metadata::Orientation as Exif;
        match exif {
            Exif::NoTransforms | Exif::FlipHorizontal => Self::new(0),
            Exif::Rotate90 | Exif::Rotate90FlipH => Self::new(-90),
            Exif::Rotate180 | Exif::FlipVertical => Self::new(180),
            Exif::Rotate270 | Exif::Rotate270FlipH => Self::new(-270),
        }
    }
}

/// Full specification for one decode: the box the result must fit in and the
/// orientation correction to apply afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    pub target_long_side: u32,
    pub target_short_side: u32,
    pub orientation: Orientation,
}

impl DecodeParams {
    pub fn new(target_long_side: u32, target_short_side: u32) -> Self {
        Self {
            target_long_side,
            target_short_side,
            orientation: Orientation::default(),
        }
    }

    pub fn with_orientation(self, orientation: Orientation) -> Self {
        Self {
            orientation,
            ..self
        }
    }
}
