use rayon::prelude::*;
use tweenflow_image::{Image, ImageError};

/// A separable 2D filter that applies horizontal and vertical 1D convolutions sequentially.
///
/// Samples outside the image replicate the closest edge pixel.
struct SeparableFilter<'a> {
    kernel_x: &'a [f32],
    kernel_y: &'a [f32],
    half_x: isize,
    half_y: isize,
}

impl<'a> SeparableFilter<'a> {
    fn new(kernel_x: &'a [f32], kernel_y: &'a [f32]) -> Self {
        Self {
            kernel_x,
            kernel_y,
            half_x: (kernel_x.len() / 2) as isize,
            half_y: (kernel_y.len() / 2) as isize,
        }
    }

    fn apply<const C: usize>(&self, src: &Image<f32, C>, dst: &mut Image<f32, C>) {
        let rows = src.rows();
        let cols = src.cols();
        if rows == 0 || cols == 0 {
            return;
        }

        let src_data = src.as_slice();
        let mut temp = vec![0.0f32; src_data.len()];
        let stride = cols * C;

        // horizontal pass
        temp.par_chunks_mut(stride)
            .zip(src_data.par_chunks(stride))
            .for_each(|(row_temp, row_src)| {
                for c in 0..cols {
                    let mut acc = [0.0f32; C];
                    for (i, &k) in self.kernel_x.iter().enumerate() {
                        let x = (c as isize + i as isize - self.half_x).clamp(0, cols as isize - 1)
                            as usize;
                        for (ch, acc_val) in acc.iter_mut().enumerate() {
                            *acc_val += row_src[x * C + ch] * k;
                        }
                    }
                    row_temp[c * C..(c + 1) * C].copy_from_slice(&acc);
                }
            });

        // vertical pass
        dst.as_slice_mut()
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(r, row_dst)| {
                row_dst.fill(0.0);
                for (i, &k) in self.kernel_y.iter().enumerate() {
                    let y = (r as isize + i as isize - self.half_y).clamp(0, rows as isize - 1)
                        as usize;
                    let row_temp = &temp[y * stride..(y + 1) * stride];
                    row_dst
                        .iter_mut()
                        .zip(row_temp.iter())
                        .for_each(|(d, &t)| *d += t * k);
                }
            });
    }
}

/// Apply a separable filter to an image.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
///
/// # Errors
///
/// Fails if a kernel is empty or the images differ in size.
pub fn separable_filter<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<(), ImageError> {
    if kernel_x.is_empty() || kernel_y.is_empty() {
        return Err(ImageError::InvalidKernelLength(
            kernel_x.len(),
            kernel_y.len(),
        ));
    }

    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    SeparableFilter::new(kernel_x, kernel_y).apply(src, dst);
    Ok(())
}
