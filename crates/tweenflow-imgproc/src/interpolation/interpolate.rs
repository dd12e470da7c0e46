use super::bilinear::bilinear_interpolation;
use tweenflow_image::Image;

/// Interpolation mode for the resampling operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Bilinear interpolation
    #[default]
    Bilinear,
}

/// Policy for sampling coordinates that fall outside the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderMode {
    /// Fill with a constant value.
    Constant(f32),
    /// Clamp the coordinate to the closest edge pixel.
    Replicate,
}

impl Default for BorderMode {
    fn default() -> Self {
        BorderMode::Constant(0.0)
    }
}

/// Kernel for interpolating a pixel value
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
/// * `border` - What to return for coordinates outside the image.
///
/// # Returns
///
/// The interpolated pixel values.
pub fn interpolate_pixel<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
    border: BorderMode,
) -> [f32; C] {
    let max_u = (image.cols() - 1) as f32;
    let max_v = (image.rows() - 1) as f32;

    // NOTE: NaN coordinates fail every comparison and land on the border
    let inside = u >= 0.0 && v >= 0.0 && u <= max_u && v <= max_v;

    let (u, v) = match border {
        BorderMode::Constant(value) if !inside => return [value; C],
        BorderMode::Constant(_) => (u, v),
        BorderMode::Replicate => (u.clamp(0.0, max_u), v.clamp(0.0, max_v)),
    };

    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tweenflow_image::ImageError;

    #[test]
    fn constant_border() -> Result<(), ImageError> {
        let image = Image::<f32, 2>::from_size_val([3, 3].into(), 5.0)?;
        let mode = InterpolationMode::Bilinear;
        let border = BorderMode::Constant(-1.0);

        assert_eq!(interpolate_pixel(&image, 1.5, 0.5, mode, border), [5.0; 2]);
        assert_eq!(interpolate_pixel(&image, 2.0, 2.0, mode, border), [5.0; 2]);
        assert_eq!(interpolate_pixel(&image, 2.01, 1.0, mode, border), [-1.0; 2]);
        assert_eq!(interpolate_pixel(&image, -0.5, 1.0, mode, border), [-1.0; 2]);
        assert_eq!(
            interpolate_pixel(&image, f32::NAN, 1.0, mode, border),
            [-1.0; 2]
        );

        Ok(())
    }

    #[test]
    fn replicate_border() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new([2, 1].into(), vec![1.0, 3.0])?;
        let mode = InterpolationMode::Bilinear;

        assert_eq!(
            interpolate_pixel(&image, 9.0, 0.0, mode, BorderMode::Replicate),
            [3.0]
        );
        assert_eq!(
            interpolate_pixel(&image, -4.0, -2.0, mode, BorderMode::Replicate),
            [1.0]
        );

        Ok(())
    }
}
