use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Instant,
};

use tokio_util::sync::CancellationToken;
use tweenflow_flow::{MotionEstimator, Resampler};
use tweenflow_image::{Image, ImageDtype};
use tweenflow_imgproc::parallel::{par_iter_rows_two, try_for_each_with, ExecutionStrategy};
use tweenflow_io::{ImageLayout, IoError};

use crate::{
    error::InterpolationError, storage::FrameStorage, template::PathTemplate,
    weights::TemporalWeights,
};

/// Settings of an [`Interpolator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpolationConfig {
    /// Number of output slots per original interval; at least 2.
    pub factor: usize,
    /// How frame pairs are scheduled.
    pub strategy: ExecutionStrategy,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            factor: 2,
            strategy: ExecutionStrategy::default(),
        }
    }
}

/// Motion-compensated frame interpolation over a stored sequence.
///
/// For every pair of original frames the interpolator estimates a forward and
/// a backward displacement field once, then synthesizes each intermediate
/// frame by warping both neighbors toward its timestamp and blending them
/// with [`TemporalWeights`].
pub struct Interpolator<E, R, S> {
    estimator: E,
    resampler: R,
    storage: S,
    template: PathTemplate,
    config: InterpolationConfig,
    cancel: CancellationToken,
}

impl<E, R, S> Interpolator<E, R, S>
where
    E: MotionEstimator,
    R: Resampler,
{
    /// Create an interpolator.
    ///
    /// # Errors
    ///
    /// Returns [`InterpolationError::InvalidFactor`] if `config.factor < 2`.
    pub fn new(
        estimator: E,
        resampler: R,
        storage: S,
        template: PathTemplate,
        config: InterpolationConfig,
    ) -> Result<Self, InterpolationError> {
        if config.factor < 2 {
            return Err(InterpolationError::InvalidFactor {
                factor: config.factor,
                gap: 0,
            });
        }

        Ok(Self {
            estimator,
            resampler,
            storage,
            template,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop scheduling new pairs once `cancel` is triggered.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The frame storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The filename template.
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// The interpolator settings.
    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Consume the interpolator and return its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn check_gap(&self, prev_index: usize, next_index: usize) -> Result<(), InterpolationError> {
        let factor = self.config.factor;
        let gap = next_index.saturating_sub(prev_index);
        if gap == 0 || gap % factor != 0 {
            return Err(InterpolationError::InvalidFactor { factor, gap });
        }
        Ok(())
    }

    fn load<T, const C: usize>(&self, index: usize) -> Result<Image<T, C>, InterpolationError>
    where
        T: ImageDtype,
        S: FrameStorage<T, C>,
    {
        let path = self.template.path_for(index);
        if !self.storage.exists(&path) {
            return Err(InterpolationError::MissingFrame { index, path });
        }
        log::info!("reading image {}", path.display());
        self.storage.read(&path).map_err(|e| match e {
            InterpolationError::Io(IoError::LayoutMismatch { expected, found }) => {
                InterpolationError::DimensionMismatch {
                    index,
                    expected,
                    found,
                }
            }
            e => e,
        })
    }

    /// Synthesize every frame strictly between `prev_index` and `next_index`.
    ///
    /// # Errors
    ///
    /// * [`InterpolationError::InvalidFactor`] if the gap is not a positive multiple of the factor.
    /// * [`InterpolationError::MissingFrame`] if either original is absent.
    /// * [`InterpolationError::DimensionMismatch`] if the originals differ in size,
    ///   or a stored frame does not hold `C` channels of type `T`.
    ///
    /// # Returns
    ///
    /// The indices of the written frames.
    pub fn interpolate_pair<T, const C: usize>(
        &self,
        prev_index: usize,
        next_index: usize,
    ) -> Result<Vec<usize>, InterpolationError>
    where
        T: ImageDtype,
        S: FrameStorage<T, C>,
    {
        self.check_gap(prev_index, next_index)?;

        let prev = self.load::<T, C>(prev_index)?;
        let next = self.load::<T, C>(next_index)?;
        if prev.size() != next.size() {
            return Err(InterpolationError::DimensionMismatch {
                index: next_index,
                expected: ImageLayout::of(&prev),
                found: ImageLayout::of(&next),
            });
        }

        let prev = prev.to_f32();
        let next = next.to_f32();

        let start = Instant::now();
        let forward = self.estimator.estimate(&next, &prev, None)?;
        let backward = self.estimator.estimate(&prev, &next, None)?;
        log::debug!(
            "motion fields for {prev_index}..{next_index} in {:?}",
            start.elapsed()
        );

        let targets = (prev_index + 1..next_index).collect::<Vec<_>>();
        let strategy = match self.config.strategy {
            ExecutionStrategy::Serial => ExecutionStrategy::Serial,
            _ => ExecutionStrategy::Parallel,
        };

        try_for_each_with(&targets, strategy, |&index| {
            let w = TemporalWeights::at(prev_index, next_index, index);

            // each field is scaled by the weight of the opposite neighbor
            let prev_warped = self.resampler.warp(&prev, &forward.scaled(w.next))?;
            let next_warped = self.resampler.warp(&next, &backward.scaled(w.prev))?;

            let mut blended = Image::<f32, C>::from_size_val(prev.size(), 0.0)?;
            par_iter_rows_two(&prev_warped, &next_warped, &mut blended, |p, n, out| {
                for ((o, &p), &n) in out.iter_mut().zip(p).zip(n) {
                    *o = p * w.prev + n * w.next;
                }
            });

            let path = self.template.path_for(index);
            log::info!("writing image {}", path.display());
            self.storage.write(&path, &blended.to_dtype::<T>())
        })?;

        Ok(targets)
    }

    /// Interpolate between consecutive entries of `keyframes`.
    ///
    /// Every gap is validated before any frame is written. Pairs are scheduled
    /// with the configured [`ExecutionStrategy`] and the cancellation token is
    /// checked before each pair starts.
    ///
    /// # Returns
    ///
    /// The number of written frames.
    pub fn interpolate_keyframes<T, const C: usize>(
        &self,
        keyframes: &[usize],
    ) -> Result<usize, InterpolationError>
    where
        T: ImageDtype,
        S: FrameStorage<T, C>,
    {
        let pairs = keyframes
            .windows(2)
            .map(|w| (w[0], w[1]))
            .collect::<Vec<_>>();
        for &(prev, next) in &pairs {
            self.check_gap(prev, next)?;
        }

        let written = AtomicUsize::new(0);
        try_for_each_with(&pairs, self.config.strategy, |&(prev, next)| {
            if self.cancel.is_cancelled() {
                return Err(InterpolationError::Cancelled);
            }
            let frames = self.interpolate_pair::<T, C>(prev, next)?;
            written.fetch_add(frames.len(), Ordering::Relaxed);
            Ok(())
        })?;

        Ok(written.into_inner())
    }

    /// Interpolate a renumbered sequence.
    ///
    /// The pairs are `(i * factor, (i + 1) * factor)` for `i` in
    /// `first..first + span / factor`, where `span` is the length of the
    /// expanded timeline, i.e. `(n - 1) * factor` for `n` originals.
    ///
    /// # Errors
    ///
    /// Returns [`InterpolationError::InvalidFactor`] if `span` is not a multiple of the factor.
    pub fn interpolate_sequence<T, const C: usize>(
        &self,
        first: usize,
        span: usize,
    ) -> Result<usize, InterpolationError>
    where
        T: ImageDtype,
        S: FrameStorage<T, C>,
    {
        let factor = self.config.factor;
        if span % factor != 0 {
            return Err(InterpolationError::InvalidFactor { factor, gap: span });
        }

        let keyframes = (first..=first + span / factor)
            .map(|i| i * factor)
            .collect::<Vec<_>>();

        self.interpolate_keyframes::<T, C>(&keyframes)
    }
}
