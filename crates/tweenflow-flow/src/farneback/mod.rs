//! Dense optical flow from polynomial expansion.
//!
//! Both frames are approximated in every neighborhood by a quadratic
//! polynomial. For a pure translation the linear coefficients of the two
//! expansions differ by `-2 A d`, which yields a per-pixel linear system for
//! the displacement `d`. The systems are averaged over a gaussian window,
//! solved, and the solution is refined iteratively over an image pyramid.

mod poly_exp;

use std::time::Instant;

use rayon::prelude::*;
use tweenflow_image::{Image, ImageSize};
use tweenflow_imgproc::{
    filter::{gaussian_blur, kernels::gaussian_kernel_size},
    interpolation::{interpolate_pixel, BorderMode, InterpolationMode},
    resize::resize,
};

use crate::{
    error::FlowError,
    estimator::{check_inputs, MotionEstimator},
    field::DisplacementField,
};

use poly_exp::{poly_expansion, PolyBasis, PolyImage, POLY_CHANNELS};

/// Pyramid levels whose smaller side would drop below this are skipped.
const MIN_LEVEL_SIZE: usize = 32;

/// Pixels closer than this to the image edge get a reduced confidence.
const BORDER: usize = 5;
const BORDER_WEIGHTS: [f32; BORDER] = [0.14, 0.14, 0.4472, 0.8521, 1.0];

/// Added to the determinant of the averaged system before inversion.
const DET_REGULARIZATION: f32 = 1e-3;

/// Parameters of the [`FarnebackEstimator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarnebackParams {
    /// Number of pyramid levels, including the full resolution one.
    pub levels: usize,
    /// Side of the gaussian averaging window; even values are rounded up.
    pub wside: usize,
    /// Iterations per pyramid level.
    pub iters: usize,
    /// Radius of the polynomial expansion neighborhood.
    pub poly_n: usize,
    /// Standard deviation of the polynomial expansion applicability.
    pub poly_sigma: f32,
    /// Scale between consecutive pyramid levels.
    pub pyr_scale: f32,
}

impl Default for FarnebackParams {
    fn default() -> Self {
        Self {
            levels: 3,
            wside: 33,
            iters: 3,
            poly_n: 5,
            poly_sigma: 1.2,
            pyr_scale: 0.5,
        }
    }
}

impl FarnebackParams {
    /// Check every parameter against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), FlowError> {
        let invalid = |name: &'static str, reason: String| {
            Err(FlowError::InvalidParameter { name, reason })
        };

        if self.levels == 0 {
            return invalid("levels", "must be at least 1".to_string());
        }
        if self.wside < 3 {
            return invalid("wside", format!("must be at least 3, got {}", self.wside));
        }
        if self.iters == 0 {
            return invalid("iters", "must be at least 1".to_string());
        }
        if self.poly_n == 0 {
            return invalid("poly_n", "must be at least 1".to_string());
        }
        if !(self.poly_sigma > 0.0 && self.poly_sigma.is_finite()) {
            return invalid("poly_sigma", format!("must be > 0, got {}", self.poly_sigma));
        }
        if !(self.pyr_scale > 0.0 && self.pyr_scale < 1.0) {
            return invalid(
                "pyr_scale",
                format!("must be in (0, 1), got {}", self.pyr_scale),
            );
        }
        Ok(())
    }

    /// The averaging window side, forced to be odd.
    pub fn window(&self) -> usize {
        self.wside | 1
    }

    /// Sigma of the averaging window, `0.3` times its half side.
    pub fn window_sigma(&self) -> f32 {
        (self.window() / 2) as f32 * 0.3
    }
}

/// Dense motion estimator based on polynomial expansion.
///
/// # Example
///
/// ```
/// use tweenflow_flow::{FarnebackEstimator, MotionEstimator};
/// use tweenflow_image::Image;
///
/// let a = Image::<f32, 1>::from_size_val([16, 16].into(), 3.0).unwrap();
/// let field = FarnebackEstimator::default().estimate(&a, &a, None).unwrap();
///
/// assert_eq!(field.max_magnitude(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct FarnebackEstimator {
    params: FarnebackParams,
    basis: PolyBasis,
}

impl Default for FarnebackEstimator {
    fn default() -> Self {
        let params = FarnebackParams::default();
        Self {
            basis: PolyBasis::new(params.poly_n, params.poly_sigma),
            params,
        }
    }
}

impl FarnebackEstimator {
    /// Create an estimator after validating `params`.
    pub fn new(params: FarnebackParams) -> Result<Self, FlowError> {
        params.validate()?;
        Ok(Self {
            basis: PolyBasis::new(params.poly_n, params.poly_sigma),
            params,
        })
    }

    /// The parameters this estimator was built with.
    pub fn params(&self) -> &FarnebackParams {
        &self.params
    }

    /// Sizes and scales of the pyramid, finest level first.
    fn pyramid_levels(&self, size: ImageSize) -> Vec<(ImageSize, f32)> {
        let mut levels = vec![(size, 1.0)];
        let mut scale = 1.0f32;
        for _ in 1..self.params.levels {
            scale *= self.params.pyr_scale;
            let level = ImageSize {
                width: (size.width as f32 * scale).round() as usize,
                height: (size.height as f32 * scale).round() as usize,
            };
            if level.width < MIN_LEVEL_SIZE || level.height < MIN_LEVEL_SIZE {
                break;
            }
            levels.push((level, scale));
        }
        levels
    }

    /// Smooth and downsample `image` to a pyramid level.
    fn level_image(
        image: &Image<f32, 1>,
        size: ImageSize,
        scale: f32,
    ) -> Result<Image<f32, 1>, FlowError> {
        if size == image.size() {
            return Ok(image.clone());
        }

        let sigma = (1.0 / scale - 1.0) * 0.5;
        let ksize = gaussian_kernel_size(sigma).max(3);
        let mut blurred = Image::from_size_val(image.size(), 0.0)?;
        gaussian_blur(image, &mut blurred, (ksize, ksize), (sigma, sigma))?;

        Ok(resize(&blurred, size, InterpolationMode::Bilinear)?)
    }

    /// Solve the averaged systems for the displacement of every pixel.
    fn solve(&self, matrices: &Image<f32, POLY_CHANNELS>) -> Result<DisplacementField, FlowError> {
        let window = self.params.window();
        let sigma = self.params.window_sigma();
        let mut blurred = Image::from_size_val(matrices.size(), 0.0)?;
        gaussian_blur(matrices, &mut blurred, (window, window), (sigma, sigma))?;

        let data = blurred
            .as_slice()
            .par_chunks_exact(POLY_CHANNELS)
            .flat_map_iter(|m| {
                let [g11, g12, g22, h1, h2] = [m[0], m[1], m[2], m[3], m[4]];
                let idet = 1.0 / (g11 * g22 - g12 * g12 + DET_REGULARIZATION);
                [(g22 * h1 - g12 * h2) * idet, (g11 * h2 - g12 * h1) * idet]
            })
            .collect::<Vec<_>>();

        Ok(DisplacementField::from(Image::<f32, 2>::new(
            matrices.size(),
            data,
        )?))
    }
}

/// Confidence of a pixel given its distance to the closest edge.
fn border_weight(x: usize, y: usize, size: ImageSize) -> f32 {
    let edge = |i: usize, len: usize| {
        let d = i.min(len.saturating_sub(i + 1));
        if d < BORDER {
            BORDER_WEIGHTS[d]
        } else {
            1.0
        }
    };
    edge(x, size.width) * edge(y, size.height)
}

/// Build the per-pixel normal equations `[g11, g12, g22, h1, h2]`.
///
/// The expansion of `reference` is sampled at the current displacement. When
/// that point leaves the image only the expansion of `predicted` contributes.
fn update_matrices(
    predicted: &PolyImage,
    reference: &PolyImage,
    flow: &DisplacementField,
) -> Result<Image<f32, POLY_CHANNELS>, FlowError> {
    let size = predicted.size();
    let mut matrices = Image::from_size_val(size, 0.0)?;
    let cols = size.width;
    if cols == 0 {
        return Ok(matrices);
    }

    let r1 = predicted.as_slice();
    let d = flow.as_slice();

    matrices
        .as_slice_mut()
        .par_chunks_exact_mut(POLY_CHANNELS * cols)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.chunks_exact_mut(POLY_CHANNELS).enumerate() {
                let i = y * cols + x;
                let p1 = &r1[i * POLY_CHANNELS..(i + 1) * POLY_CHANNELS];
                let (dx, dy) = (d[2 * i], d[2 * i + 1]);

                let p2 = interpolate_pixel(
                    reference,
                    x as f32 + dx,
                    y as f32 + dy,
                    InterpolationMode::Bilinear,
                    BorderMode::Constant(0.0),
                );

                let axx = 0.5 * (p1[2] + p2[2]);
                let ayy = 0.5 * (p1[3] + p2[3]);
                let axy = 0.5 * (p1[4] + p2[4]);

                let bx = 0.5 * (p1[0] - p2[0]) + axx * dx + axy * dy;
                let by = 0.5 * (p1[1] - p2[1]) + axy * dx + ayy * dy;

                let w = border_weight(x, y, size);
                out[0] = w * (axx * axx + axy * axy);
                out[1] = w * axy * (axx + ayy);
                out[2] = w * (axy * axy + ayy * ayy);
                out[3] = w * (axx * bx + axy * by);
                out[4] = w * (axy * bx + ayy * by);
            }
        });

    Ok(matrices)
}

impl MotionEstimator for FarnebackEstimator {
    fn estimate<const C: usize>(
        &self,
        predicted: &Image<f32, C>,
        reference: &Image<f32, C>,
        initial: Option<&DisplacementField>,
    ) -> Result<DisplacementField, FlowError> {
        check_inputs(predicted, reference, initial)?;

        let size = predicted.size();
        if size.area() == 0 {
            return Ok(DisplacementField::zeros(size));
        }

        let start = Instant::now();
        let predicted = predicted.mean_channels();
        let reference = reference.mean_channels();
        let levels = self.pyramid_levels(size);

        // start at the coarsest level from the seed, if any
        let coarsest = levels.last().map_or(size, |level| level.0);
        let mut flow = match initial {
            Some(seed) => seed.resized(coarsest)?,
            None => DisplacementField::zeros(coarsest),
        };

        for &(level_size, scale) in levels.iter().rev() {
            flow = flow.resized(level_size)?;

            let poly1 = poly_expansion(
                &Self::level_image(&predicted, level_size, scale)?,
                &self.basis,
            )?;
            let poly2 = poly_expansion(
                &Self::level_image(&reference, level_size, scale)?,
                &self.basis,
            )?;

            for _ in 0..self.params.iters {
                let matrices = update_matrices(&poly1, &poly2, &flow)?;
                flow = self.solve(&matrices)?;
            }
        }

        log::debug!(
            "farneback {size} over {} level(s) in {:?}",
            levels.len(),
            start.elapsed()
        );

        Ok(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pattern(x: f32, y: f32) -> f32 {
        128.0 + 60.0 * (x * 0.15).sin() * (y * 0.12).cos() + 20.0 * (y * 0.1 + x * 0.05).sin()
    }

    #[test]
    fn params_validation() {
        assert!(FarnebackParams::default().validate().is_ok());
        assert_eq!(FarnebackParams::default().window(), 33);
        assert_relative_eq!(FarnebackParams::default().window_sigma(), 4.8);
        assert_relative_eq!(
            FarnebackParams {
                wside: 4,
                ..Default::default()
            }
            .window_sigma(),
            0.6
        );
        assert_eq!(
            FarnebackParams {
                wside: 8,
                ..Default::default()
            }
            .window(),
            9
        );

        let bad = [
            FarnebackParams {
                levels: 0,
                ..Default::default()
            },
            FarnebackParams {
                wside: 2,
                ..Default::default()
            },
            FarnebackParams {
                iters: 0,
                ..Default::default()
            },
            FarnebackParams {
                poly_n: 0,
                ..Default::default()
            },
            FarnebackParams {
                poly_sigma: 0.0,
                ..Default::default()
            },
            FarnebackParams {
                pyr_scale: 1.0,
                ..Default::default()
            },
        ];
        for params in bad {
            assert!(matches!(
                FarnebackEstimator::new(params),
                Err(FlowError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn pyramid_stops_at_min_size() {
        let estimator = FarnebackEstimator::default();
        let levels = estimator.pyramid_levels([64, 80].into());
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].0, ImageSize::from([32, 40]));

        let levels = estimator.pyramid_levels([10, 10].into());
        assert_eq!(levels.len(), 1);
    }

    #[test]
    fn identical_frames_have_zero_flow() -> Result<(), FlowError> {
        let image = Image::<f32, 3>::from_fn([48, 40].into(), |x, y| {
            let v = pattern(x as f32, y as f32);
            [v, 0.5 * v, 255.0 - v]
        });
        let field = FarnebackEstimator::default().estimate(&image, &image, None)?;
        assert_eq!(field.size(), image.size());
        assert!(field.max_magnitude() < 1e-3);
        Ok(())
    }

    #[test]
    fn flat_frames_have_exactly_zero_flow() -> Result<(), FlowError> {
        let a = Image::<f32, 1>::from_size_val([40, 36].into(), 10.0)?;
        let b = Image::<f32, 1>::from_size_val([40, 36].into(), 20.0)?;
        let field = FarnebackEstimator::default().estimate(&a, &b, None)?;
        assert_eq!(field, DisplacementField::zeros(a.size()));
        Ok(())
    }

    #[test]
    fn recovers_translation() -> Result<(), FlowError> {
        let (tx, ty) = (1.5f32, -1.0f32);
        let size = ImageSize::from([64, 64]);
        let reference = Image::<f32, 1>::from_fn(size, |x, y| [pattern(x as f32, y as f32)]);
        let predicted =
            Image::<f32, 1>::from_fn(size, |x, y| [pattern(x as f32 + tx, y as f32 + ty)]);

        let field = FarnebackEstimator::default().estimate(&predicted, &reference, None)?;
        let interior = |x: usize, y: usize| (20..44).contains(&x) && (20..44).contains(&y);
        let mean = field.mean_where(interior).unwrap_or([0.0, 0.0]);

        assert_relative_eq!(mean[0], tx, epsilon = 0.3);
        assert_relative_eq!(mean[1], ty, epsilon = 0.3);
        Ok(())
    }

    #[test]
    fn warm_start_is_accepted() -> Result<(), FlowError> {
        let size = ImageSize::from([64, 64]);
        let reference = Image::<f32, 1>::from_fn(size, |x, y| [pattern(x as f32, y as f32)]);
        let predicted = Image::<f32, 1>::from_fn(size, |x, y| [pattern(x as f32 + 1.0, y as f32)]);

        let estimator = FarnebackEstimator::new(FarnebackParams {
            levels: 1,
            ..Default::default()
        })?;
        let seed = DisplacementField::constant(size, 1.0, 0.0);
        let field = estimator.estimate(&predicted, &reference, Some(&seed))?;

        let interior = |x: usize, y: usize| (20..44).contains(&x) && (20..44).contains(&y);
        let mean = field.mean_where(interior).unwrap_or([0.0, 0.0]);
        assert_relative_eq!(mean[0], 1.0, epsilon = 0.2);
        assert_relative_eq!(mean[1], 0.0, epsilon = 0.2);
        Ok(())
    }
}
