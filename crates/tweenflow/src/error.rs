use std::path::PathBuf;

use tweenflow_flow::FlowError;
use tweenflow_image::ImageError;
use tweenflow_imgproc::parallel::ParallelError;
use tweenflow_io::{ImageLayout, IoError};

/// An error type for sequence renumbering and frame interpolation.
///
/// Every variant is fatal for the run that produced it.
#[derive(thiserror::Error, Debug)]
pub enum InterpolationError {
    /// The filename template has no single `%0Nd` counter followed by an extension.
    #[error("malformed filename template {template:?}: {reason}")]
    MalformedTemplate {
        /// The offending template text.
        template: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A rename target is occupied by a frame that was not yet moved.
    #[error("cannot rename {from} to {to}: target already exists")]
    RenameCollision {
        /// Source path of the rename.
        from: PathBuf,
        /// Occupied target path.
        to: PathBuf,
    },

    /// The interpolation factor does not divide the index gap, or is below 2.
    #[error("invalid interpolation factor {factor} for index gap {gap}")]
    InvalidFactor {
        /// The configured factor.
        factor: usize,
        /// The gap between the two original indices, or 0 for a bad factor.
        gap: usize,
    },

    /// An expected input frame is absent.
    #[error("missing frame {index} at {path}")]
    MissingFrame {
        /// Index of the frame.
        index: usize,
        /// Path derived from the template.
        path: PathBuf,
    },

    /// A frame differs from its pair, or from the requested pixel format, in
    /// size, channel count or sample depth.
    #[error("frame {index} is {found}, expected {expected}")]
    DimensionMismatch {
        /// Index of the mismatching frame.
        index: usize,
        /// Layout of the first frame of the pair, or the requested format.
        expected: ImageLayout,
        /// Layout of the frame at `index`.
        found: ImageLayout,
    },

    /// The run was cancelled before it finished.
    #[error("interpolation cancelled")]
    Cancelled,

    /// Error from the frame storage.
    #[error("storage error on {path}: {source}")]
    Storage {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Error reading or writing an image file.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Error from an image operation.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error from motion estimation or resampling.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// Error setting up parallel execution.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}
