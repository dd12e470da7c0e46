use crate::interpolation::{grid::meshgrid_scaled, remap, BorderMode, InterpolationMode};
use tweenflow_image::{Image, ImageError, ImageSize};

/// Resize an image to a new size.
///
/// The function resizes an image to the size of `dst` using the specified
/// interpolation mode. Corner pixels of source and destination are aligned.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container.
/// * `interpolation` - The interpolation mode to use.
///
/// # Example
///
/// ```
/// use tweenflow_image::{Image, ImageSize};
/// use tweenflow_imgproc::resize::resize_native;
/// use tweenflow_imgproc::interpolation::InterpolationMode;
///
/// let image = Image::<_, 3>::new(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     vec![0f32; 4 * 5 * 3],
/// )
/// .unwrap();
///
/// let new_size = ImageSize {
///     width: 2,
///     height: 3,
/// };
///
/// let mut image_resized = Image::<_, 3>::from_size_val(new_size, 0.0).unwrap();
///
/// resize_native(
///     &image,
///     &mut image_resized,
///     InterpolationMode::Bilinear,
/// )
/// .unwrap();
///
/// assert_eq!(image_resized.num_channels(), 3);
/// assert_eq!(image_resized.size().width, 2);
/// assert_eq!(image_resized.size().height, 3);
/// ```
pub fn resize_native<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    if src.size() == dst.size() {
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    // create a grid of x and y coordinates for the output image
    // and interpolate the values from the input image.
    let map = meshgrid_scaled(src.size(), dst.size());

    remap(src, dst, &map, interpolation, BorderMode::Replicate)
}

/// Resize an image and return the result as a new image.
pub fn resize<const C: usize>(
    src: &Image<f32, C>,
    new_size: ImageSize,
    interpolation: InterpolationMode,
) -> Result<Image<f32, C>, ImageError> {
    let mut dst = Image::from_size_val(new_size, 0.0)?;
    resize_native(src, &mut dst, interpolation)?;
    Ok(dst)
}
