use tweenflow_image::Image;

use crate::{error::FlowError, field::DisplacementField};

/// A dense motion estimator.
///
/// Given a `predicted` and a `reference` frame of the same size, an estimator
/// returns a field `F` on the grid of `predicted` such that
/// `predicted(p) ≈ reference(p + F(p))`. Warping `reference` by `F` therefore
/// predicts `predicted`.
///
/// An optional `initial` field seeds iterative estimators; implementations
/// without a notion of warm start may ignore it.
pub trait MotionEstimator: Send + Sync {
    /// Estimate the displacement field between two frames.
    ///
    /// # Errors
    ///
    /// Fails with [`FlowError::SizeMismatch`] when the frames, or the initial
    /// field, do not share a size.
    fn estimate<const C: usize>(
        &self,
        predicted: &Image<f32, C>,
        reference: &Image<f32, C>,
        initial: Option<&DisplacementField>,
    ) -> Result<DisplacementField, FlowError>;
}

/// Check that `reference` and an optional `initial` field match `predicted`.
pub fn check_inputs<const C: usize>(
    predicted: &Image<f32, C>,
    reference: &Image<f32, C>,
    initial: Option<&DisplacementField>,
) -> Result<(), FlowError> {
    let expected = predicted.size();
    let sizes = std::iter::once(reference.size()).chain(initial.map(|f| f.size()));
    for found in sizes {
        if found != expected {
            return Err(FlowError::SizeMismatch { expected, found });
        }
    }
    Ok(())
}

/// An estimator that reports no motion at all.
///
/// Blending with zero fields degrades to a plain temporal cross-fade.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroMotion;

impl MotionEstimator for ZeroMotion {
    fn estimate<const C: usize>(
        &self,
        predicted: &Image<f32, C>,
        reference: &Image<f32, C>,
        initial: Option<&DisplacementField>,
    ) -> Result<DisplacementField, FlowError> {
        check_inputs(predicted, reference, initial)?;
        Ok(DisplacementField::zeros(predicted.size()))
    }
}
