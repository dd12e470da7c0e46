use tweenflow_image::{ImageError, ImageSize};

/// An error type for motion estimation and resampling.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FlowError {
    /// Two inputs that must share a size do not.
    #[error("size mismatch: expected {expected}, found {found}")]
    SizeMismatch {
        /// The size required by the operation.
        expected: ImageSize,
        /// The size that was provided.
        found: ImageSize,
    },

    /// An estimator parameter is outside its valid range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Error from an image operation.
    #[error(transparent)]
    Image(#[from] ImageError),
}
