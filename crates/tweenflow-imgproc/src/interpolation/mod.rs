//! Pixel interpolation methods for image resampling.
//!
//! This module provides the sampling kernels used when an image is read at
//! non-integer coordinates, as happens when warping a frame along a dense
//! displacement field or when building an image pyramid.
//!
//! # Interpolation Modes
//!
//! - **Bilinear**: linear interpolation between the four adjacent pixels
//!
//! # Border Modes
//!
//! - **Constant**: coordinates outside the image read a fixed value
//! - **Replicate**: coordinates are clamped to the closest edge pixel

mod bilinear;

/// Grid generation and coordinate mapping utilities.
pub mod grid;

pub(crate) mod interpolate;
mod remap;

pub use interpolate::{interpolate_pixel, BorderMode, InterpolationMode};
pub use remap::remap;
