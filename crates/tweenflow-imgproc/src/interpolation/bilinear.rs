use tweenflow_image::Image;

/// Kernel for bilinear interpolation
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate, in `[0, cols - 1]`.
/// * `v` - The y coordinate of the pixel to interpolate, in `[0, rows - 1]`.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn bilinear_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let iu0 = (u.trunc() as usize).min(cols - 1);
    let iv0 = (v.trunc() as usize).min(rows - 1);

    let frac_u = u - iu0 as f32;
    let frac_v = v - iv0 as f32;

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    let w00 = frac_uu * frac_vv;
    let w01 = frac_u * frac_vv;
    let w10 = frac_uu * frac_v;
    let w11 = frac_u * frac_v;

    let iu1 = if iu0 + 1 < cols { iu0 + 1 } else { iu0 };
    let iv1 = if iv0 + 1 < rows { iv0 + 1 } else { iv0 };

    let data = image.as_slice();
    let at = |iv: usize, iu: usize| {
        let base = (iv * cols + iu) * C;
        &data[base..base + C]
    };

    let p00 = at(iv0, iu0);
    let p01 = at(iv0, iu1);
    let p10 = at(iv1, iu0);
    let p11 = at(iv1, iu1);

    let mut pixel = [0.0; C];
    for (k, px) in pixel.iter_mut().enumerate() {
        *px = p00[k] * w00 + p01[k] * w01 + p10[k] * w10 + p11[k] * w11;
    }

    pixel
}

#[cfg(test)]
mod tests {
    use super::bilinear_interpolation;
    use tweenflow_image::{Image, ImageError};

    #[test]
    fn bilinear_center() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new([2, 2].into(), vec![0.0, 1.0, 2.0, 3.0])?;
        assert_eq!(bilinear_interpolation(&image, 0.5, 0.5), [1.5]);
        assert_eq!(bilinear_interpolation(&image, 1.0, 1.0), [3.0]);
        assert_eq!(bilinear_interpolation(&image, 0.0, 0.0), [0.0]);
        Ok(())
    }
}
