use tweenflow_image::Image;
use tweenflow_imgproc::interpolation::{remap, BorderMode, InterpolationMode};

use crate::{error::FlowError, field::DisplacementField};

/// Motion-compensated resampling.
///
/// `warp` produces an image on the grid of `field` whose pixel `p` is
/// `source` sampled at `p + field(p)`.
pub trait Resampler: Send + Sync {
    /// Warp `source` along `field`.
    ///
    /// # Errors
    ///
    /// Fails with [`FlowError::SizeMismatch`] when `source` and `field` differ in size.
    fn warp<const C: usize>(
        &self,
        source: &Image<f32, C>,
        field: &DisplacementField,
    ) -> Result<Image<f32, C>, FlowError>;
}

/// Bilinear resampler backed by [`remap`].
///
/// Sampling coordinates outside `[0, w - 1] x [0, h - 1]` read `border_value`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RemapResampler {
    /// Value returned for coordinates outside the source.
    pub border_value: f32,
}

impl Default for RemapResampler {
    fn default() -> Self {
        Self { border_value: 0.0 }
    }
}

impl RemapResampler {
    /// Create a resampler with the given border value.
    pub fn new(border_value: f32) -> Self {
        Self { border_value }
    }
}

impl Resampler for RemapResampler {
    fn warp<const C: usize>(
        &self,
        source: &Image<f32, C>,
        field: &DisplacementField,
    ) -> Result<Image<f32, C>, FlowError> {
        if source.size() != field.size() {
            return Err(FlowError::SizeMismatch {
                expected: field.size(),
                found: source.size(),
            });
        }

        let map = field.sampling_map();
        let mut dst = Image::from_size_val(field.size(), 0.0)?;
        remap(
            source,
            &mut dst,
            &map,
            InterpolationMode::Bilinear,
            BorderMode::Constant(self.border_value),
        )?;

        Ok(dst)
    }
}
