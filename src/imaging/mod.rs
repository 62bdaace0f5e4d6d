//! Image decoding in pure Rust, with no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image` decoders, power-of-two subsample, `Triangle` resize |
//! | **Orientation** | quarter-turn rotations from `image::imageops` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for sample factors and dimension math (unit testable)
//! - **Parameters**: Data structures describing a decode
//! - **Backend**: [`ImageDecoder`] trait + [`RustDecoder`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{DecodeError, DecodedImage, Dimensions, ImageDecoder};
pub use calculations::{
    SampleSize, fit_ratio, long_short, sample_size, scaled_dimensions,
    subsampled_dimensions, target_sides,
};
pub use params::{DecodeParams, Orientation};
pub use rust_backend::RustDecoder;
