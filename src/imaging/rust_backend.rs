//! Pure Rust decoder on top of the `image` crate.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Bounds | `ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `ImageReader::decode` |
//! | Subsample | `image::imageops::thumbnail` (box reduction by the sample factor) |
//! | Precise scale | `image::imageops::resize` with `Triangle` filter |
//! | Orientation | `image::imageops::rotate90` / `rotate180` / `rotate270` |
//!
//! Orientation convention: the provider's tag is the clockwise rotation of
//! the stored pixels, so the decoder rotates by the negative of it
//! (counter-clockwise). A tag of 90 therefore maps to `rotate270`.

use super::backend::{DecodeError, DecodedImage, Dimensions, ImageDecoder};
use super::calculations::{fit_ratio, sample_size, scaled_dimensions, subsampled_dimensions};
use super::params::{DecodeParams, Orientation};
use image::imageops::{self, FilterType};
use image::{ImageReader, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// Decoder backed by the `image` crate.
///
/// See the [module docs](self) for the crate-to-step mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustDecoder;

impl RustDecoder {
    pub fn new() -> Self {
        Self
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
    Ok(ImageReader::new(Cursor::new(bytes)).with_guessed_format()?)
}

/// Undo the stored orientation by rotating the bitmap by `-orientation`.
fn correct_orientation(
    pixels: RgbaImage,
    orientation: Orientation,
) -> Result<RgbaImage, DecodeError> {
    match orientation.degrees() {
        0 => Ok(pixels),
        90 => Ok(imageops::rotate270(&pixels)),
        180 => Ok(imageops::rotate180(&pixels)),
        270 => Ok(imageops::rotate90(&pixels)),
        other => Err(DecodeError::Orientation(other)),
    }
}

impl ImageDecoder for RustDecoder {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, DecodeError> {
        let (width, height) = reader(bytes)?
            .into_dimensions()
            .map_err(|e| DecodeError::Bounds(e.to_string()))?;
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroArea);
        }
        Ok(Dimensions { width, height })
    }

    fn decode(&self, bytes: &[u8], params: &DecodeParams) -> Result<DecodedImage, DecodeError> {
        let raw = self.identify(bytes)?;
        let sample = sample_size(
            raw.as_tuple(),
            params.target_long_side,
            params.target_short_side,
        );
        debug!(
            width = raw.width,
            height = raw.height,
            factor = sample.factor,
            "decoding with sample factor"
        );

        let decoded = reader(bytes)?
            .decode()
            .map_err(|e| DecodeError::Decode(e.to_string()))?
            .to_rgba8();

        let mut pixels = if sample.factor > 1 {
            let (w, h) = subsampled_dimensions(decoded.dimensions(), sample.factor);
            imageops::thumbnail(&decoded, w, h)
        } else {
            decoded
        };

        let ratio = fit_ratio(
            pixels.dimensions(),
            params.target_long_side,
            params.target_short_side,
        );
        if ratio < 1.0 {
            let (w, h) = scaled_dimensions(pixels.dimensions(), ratio);
            if w == 0 || h == 0 {
                return Err(DecodeError::ZeroArea);
            }
            debug!(ratio, width = w, height = h, "still too big, scaling down");
            pixels = imageops::resize(&pixels, w, h, FilterType::Triangle);
        }

        let pixels = correct_orientation(pixels, params.orientation)?;
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(DecodeError::ZeroArea);
        }
        Ok(DecodedImage::new(pixels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_png, gradient_png};

    #[test]
    fn identify_synthetic_png() {
        let bytes = gradient_png(200, 150);
        let dims = RustDecoder::new().identify(&bytes).unwrap();
        assert_eq!(dims.as_tuple(), (200, 150));
    }

    #[test]
    fn identify_garbage_errors() {
        let result = RustDecoder::new().identify(b"definitely not an image");
        assert!(result.is_err());
    }

    #[test]
    fn decode_small_image_keeps_size() {
        let bytes = gradient_png(120, 80);
        let image = RustDecoder::new()
            .decode(&bytes, &DecodeParams::new(800, 600))
            .unwrap();
        assert_eq!(image.dimensions().as_tuple(), (120, 80));
    }

    #[test]
    fn decode_large_image_fits_target_box() {
        let bytes = gradient_png(1000, 600);
        let image = RustDecoder::new()
            .decode(&bytes, &DecodeParams::new(300, 200))
            .unwrap();
        let (w, h) = image.dimensions().as_tuple();
        assert!(w <= 300, "width {w} exceeds target");
        assert!(h <= 200, "height {h} exceeds target");
        // Aspect ratio survives the subsample + scale passes
        assert!(w >= 299 || h >= 199, "image shrank more than needed: {w}x{h}");
    }

    #[test]
    fn decode_quarter_turn_swaps_dimensions() {
        let bytes = gradient_png(64, 32);
        let params = DecodeParams::new(800, 600).with_orientation(Orientation::new(90));
        let image = RustDecoder::new().decode(&bytes, &params).unwrap();
        assert_eq!(image.dimensions().as_tuple(), (32, 64));
    }

    #[test]
    fn decode_rotates_counter_clockwise() {
        // Marker pixel in the top-right corner of a 4x2 image
        let mut pixels = RgbaImage::new(4, 2);
        pixels.put_pixel(3, 0, image::Rgba([255, 0, 0, 255]));
        let bytes = encode_png(&pixels);

        let params = DecodeParams::new(100, 100).with_orientation(Orientation::new(90));
        let image = RustDecoder::new().decode(&bytes, &params).unwrap();

        // Counter-clockwise quarter turn moves top-right to top-left
        assert_eq!(image.pixels().get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn decode_rejects_odd_orientation() {
        let bytes = gradient_png(10, 10);
        let params = DecodeParams::new(100, 100).with_orientation(Orientation::new(45));
        let result = RustDecoder::new().decode(&bytes, &params);
        assert!(matches!(result, Err(DecodeError::Orientation(45))));
    }

    #[test]
    fn decode_truncated_stream_errors() {
        let bytes = gradient_png(50, 50);
        let result = RustDecoder::new().decode(&bytes[..bytes.len() / 3], &DecodeParams::new(100, 100));
        assert!(result.is_err());
    }
}
