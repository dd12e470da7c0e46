/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Error to open the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error to create the image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] tweenflow_image::ImageError),

    /// Error to decode or encode the image.
    #[error("Failed to decode or encode the image. {0}")]
    ImageCodecError(#[from] image::ImageError),

    /// The channel count cannot be represented in an image file.
    #[error("Unsupported number of channels: {0}")]
    UnsupportedChannels(usize),

    /// The pixel buffer does not fit the image dimensions.
    #[error("Pixel buffer does not match the image size {0}")]
    InvalidBuffer(tweenflow_image::ImageSize),

    /// The file holds another channel count or sample depth than requested.
    #[error("Image layout mismatch: expected {expected}, found {found}")]
    LayoutMismatch {
        /// The requested layout.
        expected: crate::functional::ImageLayout,
        /// The layout stored in the file.
        found: crate::functional::ImageLayout,
    },
}
