use tweenflow_image::{Image, ImageSize};

/// Create a meshgrid of absolute pixel coordinates.
///
/// # Arguments
///
/// * `size` - The size of the grid.
///
/// # Returns
///
/// A two channel map where the pixel at `(x, y)` holds `[x, y]`.
pub fn meshgrid(size: ImageSize) -> Image<f32, 2> {
    Image::from_fn(size, |x, y| [x as f32, y as f32])
}

/// Create a sampling map that stretches `src_size` onto `dst_size`.
///
/// Corner pixels of both grids are aligned, so the first and last rows and
/// columns of the destination sample exactly the first and last rows and
/// columns of the source.
pub fn meshgrid_scaled(src_size: ImageSize, dst_size: ImageSize) -> Image<f32, 2> {
    let step = |src: usize, dst: usize| {
        if dst > 1 {
            (src.saturating_sub(1)) as f32 / (dst - 1) as f32
        } else {
            0.0
        }
    };
    let step_x = step(src_size.width, dst_size.width);
    let step_y = step(src_size.height, dst_size.height);

    Image::from_fn(dst_size, |x, y| [x as f32 * step_x, y as f32 * step_y])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meshgrid_smoke() {
        let grid = meshgrid([2, 2].into());
        assert_eq!(grid.as_slice(), &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn meshgrid_scaled_corners() {
        let grid = meshgrid_scaled([5, 3].into(), [3, 2].into());
        assert_eq!(grid.pixel(0, 0).ok(), Some(&[0.0, 0.0][..]));
        assert_eq!(grid.pixel(2, 1).ok(), Some(&[4.0, 2.0][..]));
        assert_eq!(grid.pixel(1, 0).ok(), Some(&[2.0, 0.0][..]));
    }
}
