use std::ops;

use tweenflow_image::{Image, ImageSize};
use tweenflow_imgproc::{
    interpolation::{grid::meshgrid, InterpolationMode},
    resize::resize,
};

use crate::error::FlowError;

/// A dense displacement field.
///
/// One `[dx, dy]` vector per pixel, stored as a two channel `f32` image.
/// The vector at `p` is the offset at which a companion frame is sampled,
/// i.e. warping by the field reads the source at `p + field(p)`.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplacementField(Image<f32, 2>);

impl ops::Deref for DisplacementField {
    type Target = Image<f32, 2>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Image<f32, 2>> for DisplacementField {
    fn from(image: Image<f32, 2>) -> Self {
        Self(image)
    }
}

impl DisplacementField {
    /// A field with zero displacement everywhere.
    pub fn zeros(size: ImageSize) -> Self {
        Self(Image::from_fn(size, |_, _| [0.0, 0.0]))
    }

    /// A field with the same displacement everywhere.
    pub fn constant(size: ImageSize, dx: f32, dy: f32) -> Self {
        Self(Image::from_fn(size, |_, _| [dx, dy]))
    }

    /// Multiply every vector by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        let mut image = self.0.clone();
        image.as_slice_mut().iter_mut().for_each(|v| *v *= factor);
        Self(image)
    }

    /// Absolute sampling coordinates `p + field(p)` for every pixel.
    pub fn sampling_map(&self) -> Image<f32, 2> {
        let mut map = meshgrid(self.0.size());
        let offsets = &self.0;
        map.as_slice_mut()
            .iter_mut()
            .zip(offsets.as_slice().iter())
            .for_each(|(m, d)| *m += d);
        map
    }

    /// Largest vector length in the field.
    pub fn max_magnitude(&self) -> f32 {
        self.0
            .as_slice()
            .chunks_exact(2)
            .map(|v| v[0].hypot(v[1]))
            .fold(0.0, f32::max)
    }

    /// Resample the field to `new_size`, rescaling the vectors accordingly.
    ///
    /// Corner pixels are aligned, so vectors are stretched by the ratio of the
    /// distances between the first and last pixel of each axis.
    pub fn resized(&self, new_size: ImageSize) -> Result<Self, FlowError> {
        let old_size = self.0.size();
        if old_size == new_size {
            return Ok(self.clone());
        }

        let ratio = |old: usize, new: usize| {
            if old > 1 && new > 1 {
                (new - 1) as f32 / (old - 1) as f32
            } else {
                new as f32 / old.max(1) as f32
            }
        };
        let sx = ratio(old_size.width, new_size.width);
        let sy = ratio(old_size.height, new_size.height);

        let mut resized = resize(&self.0, new_size, InterpolationMode::Bilinear)?;
        resized.as_slice_mut().chunks_exact_mut(2).for_each(|v| {
            v[0] *= sx;
            v[1] *= sy;
        });

        Ok(Self(resized))
    }
}

#[cfg(test)]
impl DisplacementField {
    /// The displacement at `(x, y)`, or `None` outside the field.
    pub(crate) fn at(&self, x: usize, y: usize) -> Option<[f32; 2]> {
        self.0.pixel(x, y).ok().map(|v| [v[0], v[1]])
    }

    /// Mean displacement over the pixels selected by `keep(x, y)`.
    pub(crate) fn mean_where(&self, keep: impl Fn(usize, usize) -> bool) -> Option<[f32; 2]> {
        let cols = self.0.cols().max(1);
        let (sum, count) = self
            .0
            .as_slice()
            .chunks_exact(2)
            .enumerate()
            .filter(|(i, _)| keep(i % cols, i / cols))
            .fold(([0.0f64; 2], 0usize), |(acc, n), (_, v)| {
                ([acc[0] + v[0] as f64, acc[1] + v[1] as f64], n + 1)
            });
        (count > 0).then(|| [(sum[0] / count as f64) as f32, (sum[1] / count as f64) as f32])
    }
}
