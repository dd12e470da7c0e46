use crate::parallel;

use super::interpolate::interpolate_pixel;
use super::{BorderMode, InterpolationMode};
use tweenflow_image::{Image, ImageError};

/// Apply generic geometric transformation to an image.
///
/// The destination pixel at `(x, y)` is read from `src` at the coordinate
/// stored in `map` at `(x, y)`.
///
/// # Arguments
///
/// * `src` - The input image container with shape (height, width, C).
/// * `dst` - The output image container with shape (height, width, C).
/// * `map` - The absolute `[x, y]` sampling coordinates for every output pixel.
/// * `interpolation` - The interpolation mode to use.
/// * `border` - The policy for coordinates outside `src`.
///
/// # Errors
///
/// The output image must have the same size as the map.
pub fn remap<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    map: &Image<f32, 2>,
    interpolation: InterpolationMode,
    border: BorderMode,
) -> Result<(), ImageError> {
    if dst.size() != map.size() {
        return Err(ImageError::InvalidImageSize(
            map.width(),
            map.height(),
            dst.width(),
            dst.height(),
        ));
    }

    // an empty source has nothing to sample from
    if src.size().area() == 0 {
        let fill = match border {
            BorderMode::Constant(value) => value,
            BorderMode::Replicate => 0.0,
        };
        dst.as_slice_mut().fill(fill);
        return Ok(());
    }

    // parallelize the remap operation by rows
    parallel::par_iter_rows_resample(dst, map, |x, y, dst_pixel| {
        let pixel = interpolate_pixel(src, x, y, interpolation, border);
        dst_pixel.copy_from_slice(&pixel);
    });

    Ok(())
}
