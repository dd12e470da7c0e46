#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
///
/// Defines [`error::IoError`] variants for file access and encoding/decoding failures.
pub mod error;

/// High-level image reading and writing functions.
///
/// The file format is chosen from the file extension (PNG, TIFF, JPEG, BMP),
/// decoding and encoding are delegated to the `image` crate.
pub mod functional;

pub use error::IoError;
pub use functional::ImageLayout;
