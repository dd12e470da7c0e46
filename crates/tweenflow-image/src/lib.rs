#![deny(missing_docs)]
//! Image types and traits for frame interpolation

/// image representation for frame interpolation.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageDtype, ImageSize};
