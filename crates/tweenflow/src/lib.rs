#![deny(missing_docs)]
//! Motion-compensated frame-rate up-conversion.
//!
//! A sparse image sequence is first renumbered so that original frame `i`
//! sits at index `i * factor`. Every gap is then filled by estimating dense
//! motion between the two neighbors, warping both toward the intermediate
//! timestamp and blending them with linear temporal weights.

/// Error types for the interpolation pipeline.
pub mod error;

/// Motion-compensated interpolation of frame pairs.
pub mod interpolate;

/// Renumbering of an original sequence onto the expanded timeline.
pub mod renumber;

/// End-to-end run configuration and entry point.
pub mod run;

/// Abstraction over where frames are stored.
pub mod storage;

/// Mapping between frame indices and filenames.
pub mod template;

/// Temporal blend weights.
pub mod weights;

#[doc(inline)]
pub use tweenflow_flow as flow;

#[doc(inline)]
pub use tweenflow_image as image;

#[doc(inline)]
pub use tweenflow_imgproc as imgproc;

#[doc(inline)]
pub use tweenflow_io as io;

pub use error::InterpolationError;
pub use interpolate::{InterpolationConfig, Interpolator};
pub use run::{run, RunConfig, RunSummary};
pub use storage::{FrameStorage, FsStorage, MemoryStorage};
pub use template::PathTemplate;
pub use weights::TemporalWeights;
