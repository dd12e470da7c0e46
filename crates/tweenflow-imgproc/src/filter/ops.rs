use tweenflow_image::{Image, ImageError};

use super::{kernels, separable_filter};

/// Blur an image using a gaussian blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The size of the kernel (kernel_x, kernel_y).
/// * `sigma` - The sigma of the gaussian kernel.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn gaussian_blur<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_size: (usize, usize),
    sigma: (f32, f32),
) -> Result<(), ImageError> {
    let kernel_x = kernels::gaussian_kernel_1d(kernel_size.0, sigma.0);
    let kernel_y = kernels::gaussian_kernel_1d(kernel_size.1, sigma.1);
    separable_filter(src, dst, &kernel_x, &kernel_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_blur_preserves_mean() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::from_fn([8, 8].into(), |x, y| [((x + y) % 2) as f32]);
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
        gaussian_blur(&src, &mut dst, (5, 5), (1.0, 1.0))?;

        // a checkerboard blurs toward its mean
        let center = dst.get([4, 4, 0]).copied().unwrap_or_default();
        assert!((center - 0.5).abs() < 0.1);
        Ok(())
    }
}
