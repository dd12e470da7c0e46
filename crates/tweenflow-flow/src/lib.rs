#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the flow module.
pub mod error;

/// Dense per-pixel displacement fields.
pub mod field;

/// Motion estimation capability and simple estimators.
pub mod estimator;

/// Polynomial expansion dense optical flow.
pub mod farneback;

/// Motion-compensated resampling capability and the remap backend.
pub mod resampler;

pub use error::FlowError;
pub use estimator::{MotionEstimator, ZeroMotion};
pub use farneback::{FarnebackEstimator, FarnebackParams};
pub use field::DisplacementField;
pub use resampler::{RemapResampler, Resampler};
