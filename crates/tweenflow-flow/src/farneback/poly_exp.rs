use rayon::prelude::*;
use tweenflow_image::{Image, ImageError};

/// Number of coefficients kept per pixel: `[bx, by, axx, ayy, axy]`.
pub(crate) const POLY_CHANNELS: usize = 5;

/// Per-pixel quadratic model `f(p + u) - f(p) ≈ uᵀ A u + bᵀ u`.
///
/// Channel layout is `[bx, by, axx, ayy, axy]` where `axy` is the off
/// diagonal entry of the symmetric matrix `A`.
pub(crate) type PolyImage = Image<f32, POLY_CHANNELS>;

/// Weighted least squares basis for the quadratic fit over a square
/// neighborhood with gaussian applicability.
#[derive(Debug, Clone)]
pub(crate) struct PolyBasis {
    radius: usize,
    // (2 * radius + 1)^2 separable gaussian weights, row-major
    weights: Vec<f32>,
    inv_s2: f32,
    inv_s22: f32,
    s2_over_s0: f32,
    inv_even_sum: f32,
    inv_even_diff: f32,
}

impl PolyBasis {
    pub(crate) fn new(radius: usize, sigma: f32) -> Self {
        let n = radius as isize;
        let g = (-n..=n)
            .map(|i| (-((i * i) as f64) / (2.0 * sigma as f64 * sigma as f64)).exp())
            .collect::<Vec<_>>();
        let norm = g.iter().sum::<f64>();

        let (mut s0, mut s2, mut s4, mut s22) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        let mut weights = Vec::with_capacity(g.len() * g.len());
        for (iy, gy) in g.iter().enumerate() {
            let uy = (iy as isize - n) as f64;
            for (ix, gx) in g.iter().enumerate() {
                let ux = (ix as isize - n) as f64;
                let w = gx * gy / (norm * norm);
                s0 += w;
                s2 += w * ux * ux;
                s4 += w * ux * ux * ux * ux;
                s22 += w * ux * ux * uy * uy;
                weights.push(w as f32);
            }
        }

        Self {
            radius,
            weights,
            inv_s2: (1.0 / s2) as f32,
            inv_s22: (1.0 / s22) as f32,
            s2_over_s0: (s2 / s0) as f32,
            inv_even_sum: (1.0 / (s4 + s22 - 2.0 * s2 * s2 / s0)) as f32,
            inv_even_diff: (1.0 / (s4 - s22)) as f32,
        }
    }

    /// Solve the normal equations from the weighted moments of the centered signal.
    fn solve(&self, m: &Moments) -> [f32; POLY_CHANNELS] {
        let bx = m.x * self.inv_s2;
        let by = m.y * self.inv_s2;
        let axy = 0.5 * m.xy * self.inv_s22;

        // the (1, x², y²) block couples through the constant term
        let sum = (m.xx + m.yy - 2.0 * self.s2_over_s0 * m.c) * self.inv_even_sum;
        let diff = (m.xx - m.yy) * self.inv_even_diff;
        let axx = 0.5 * (sum + diff);
        let ayy = 0.5 * (sum - diff);

        [bx, by, axx, ayy, axy]
    }
}

#[derive(Default)]
struct Moments {
    c: f32,
    x: f32,
    y: f32,
    xx: f32,
    yy: f32,
    xy: f32,
}

/// Compute the quadratic polynomial expansion of a single plane.
///
/// Samples outside the image replicate the closest edge pixel. The fit is done
/// on `f - f(p)`, so a flat region expands to exactly zero coefficients.
pub(crate) fn poly_expansion(
    src: &Image<f32, 1>,
    basis: &PolyBasis,
) -> Result<PolyImage, ImageError> {
    let mut dst = PolyImage::from_size_val(src.size(), 0.0)?;
    let (cols, rows) = (src.cols(), src.rows());
    if cols == 0 || rows == 0 {
        return Ok(dst);
    }

    let data = src.as_slice();
    let n = basis.radius as isize;
    let side = 2 * basis.radius + 1;

    dst.as_slice_mut()
        .par_chunks_exact_mut(POLY_CHANNELS * cols)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, coeffs) in row.chunks_exact_mut(POLY_CHANNELS).enumerate() {
                let center = data[y * cols + x];
                let mut m = Moments::default();

                for v in -n..=n {
                    let yy = (y as isize + v).clamp(0, rows as isize - 1) as usize;
                    let src_row = &data[yy * cols..(yy + 1) * cols];
                    let w_row = &basis.weights[(v + n) as usize * side..][..side];
                    let vf = v as f32;

                    for u in -n..=n {
                        let xx = (x as isize + u).clamp(0, cols as isize - 1) as usize;
                        let d = src_row[xx] - center;
                        let wd = w_row[(u + n) as usize] * d;
                        let uf = u as f32;

                        m.c += wd;
                        m.x += wd * uf;
                        m.y += wd * vf;
                        m.xx += wd * uf * uf;
                        m.yy += wd * vf * vf;
                        m.xy += wd * uf * vf;
                    }
                }

                coeffs.copy_from_slice(&basis.solve(&m));
            }
        });

    Ok(dst)
}
