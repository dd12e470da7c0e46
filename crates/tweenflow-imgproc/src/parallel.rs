use rayon::prelude::*;
use thiserror::Error;

use tweenflow_image::Image;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how parallel operations are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool.
    #[default]
    Parallel,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small inputs, debugging, or when results must be produced in order.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call.
    Fixed(usize),
}

/// Apply a fallible operation to every item with the given strategy.
///
/// Stops at the first error. With [`ExecutionStrategy::Serial`] the items are
/// visited in order and no item after the failing one is touched.
///
/// # Errors
///
/// Returns the first error produced by `op`, or a [`ParallelError`] converted
/// into `E` if the thread pool could not be created.
pub fn try_for_each_with<T, E, F>(
    items: &[T],
    strategy: ExecutionStrategy,
    op: F,
) -> Result<(), E>
where
    T: Sync,
    E: From<ParallelError> + Send,
    F: Fn(&T) -> Result<(), E> + Sync + Send,
{
    match strategy {
        ExecutionStrategy::Serial => items.iter().try_for_each(op),
        ExecutionStrategy::Parallel => items.par_iter().try_for_each(op),
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n).into());
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            pool.install(|| items.par_iter().try_for_each(op))
        }
    }
}

/// Apply a function to each pixel for grid sampling in parallel.
///
/// `f` receives the sampling coordinate stored in `map` and the destination pixel.
pub fn par_iter_rows_resample<const C: usize>(
    dst: &mut Image<f32, C>,
    map: &Image<f32, 2>,
    f: impl Fn(f32, f32, &mut [f32]) + Send + Sync,
) {
    let cols = dst.cols();
    if cols == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .zip(map.as_slice().par_chunks_exact(2 * cols))
        .for_each(|(dst_chunk, map_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .zip(map_chunk.chunks_exact(2))
                .for_each(|(dst_pixel, xy)| {
                    f(xy[0], xy[1], dst_pixel);
                });
        });
}

/// Apply a function to each pixel of two images of the same size in parallel.
pub fn par_iter_rows_two<const C1: usize, const C2: usize, const C3: usize>(
    src1: &Image<f32, C1>,
    src2: &Image<f32, C2>,
    dst: &mut Image<f32, C3>,
    f: impl Fn(&[f32], &[f32], &mut [f32]) + Send + Sync,
) {
    let cols = src1.cols();
    if cols == 0 {
        return;
    }

    src1.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(src2.as_slice().par_chunks_exact(C2 * cols))
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C3 * cols))
        .for_each(|((src1_chunk, src2_chunk), dst_chunk)| {
            src1_chunk
                .chunks_exact(C1)
                .zip(src2_chunk.chunks_exact(C2))
                .zip(dst_chunk.chunks_exact_mut(C3))
                .for_each(|((p1, p2), d)| f(p1, p2, d));
        });
}
