use tokio_util::sync::CancellationToken;
use tweenflow_flow::{FarnebackEstimator, FarnebackParams, RemapResampler};
use tweenflow_image::ImageDtype;
use tweenflow_imgproc::parallel::ExecutionStrategy;

use crate::{
    error::InterpolationError,
    interpolate::{InterpolationConfig, Interpolator},
    renumber::renumber_sequence,
    storage::FrameStorage,
    template::PathTemplate,
};

/// Parameters of a complete up-conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Filename template of the sequence, e.g. `./img_%03d.tif`.
    pub images: String,
    /// Index of the first original frame.
    pub first_image: usize,
    /// Number of original frames.
    pub n_images: usize,
    /// Interpolation factor, at least 2.
    pub factor: usize,
    /// Spread the originals to `i * factor` before interpolating.
    pub rename: bool,
    /// Motion estimation parameters.
    pub flow: FarnebackParams,
    /// How frame pairs are scheduled.
    pub strategy: ExecutionStrategy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            images: "./img_%03d.tif".to_string(),
            first_image: 0,
            n_images: 2,
            factor: 2,
            rename: true,
            flow: FarnebackParams::default(),
            strategy: ExecutionStrategy::default(),
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Number of renamed original frames.
    pub renamed: usize,
    /// Number of synthesized frames.
    pub written: usize,
}

/// Up-convert the sequence described by `config`.
///
/// The template and every parameter are validated before storage is touched.
/// The originals are then renumbered, if requested, and every interval is
/// filled with motion-compensated frames.
///
/// # Arguments
///
/// * `config` - The run parameters.
/// * `storage` - Where the frames live.
/// * `cancel` - Stops the run before the next frame pair when triggered.
///
/// # Errors
///
/// Any [`InterpolationError`]; frames written before the failure are kept.
pub fn run<T, const C: usize, S>(
    config: &RunConfig,
    storage: S,
    cancel: CancellationToken,
) -> Result<RunSummary, InterpolationError>
where
    T: ImageDtype,
    S: FrameStorage<T, C>,
{
    let template = PathTemplate::parse(&config.images)?;
    let estimator = FarnebackEstimator::new(config.flow)?;
    let interpolator = Interpolator::new(
        estimator,
        RemapResampler::default(),
        storage,
        template,
        InterpolationConfig {
            factor: config.factor,
            strategy: config.strategy,
        },
    )?
    .with_cancellation(cancel.clone());

    if cancel.is_cancelled() {
        return Err(InterpolationError::Cancelled);
    }

    let renamed = if config.rename {
        renumber_sequence::<T, C, _>(
            interpolator.storage(),
            interpolator.template(),
            config.first_image,
            config.n_images,
            config.factor,
        )?
        .len()
    } else {
        0
    };

    let span = config.n_images.saturating_sub(1) * config.factor;
    let written = interpolator.interpolate_sequence::<T, C>(config.first_image, span)?;

    log::info!(
        "renamed {renamed} and synthesized {written} frame(s) from {} original(s)",
        config.n_images
    );

    Ok(RunSummary { renamed, written })
}
