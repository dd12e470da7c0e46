use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use tweenflow_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by the size.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

impl From<ImageSize> for [u32; 2] {
    fn from(size: ImageSize) -> Self {
        [size.width as u32, size.height as u32]
    }
}

/// Trait for image data types.
///
/// `from_f32` is the single place where blended floating point samples are
/// converted back to the storage depth: values are rounded half away from zero
/// and clamped to the representable range.
pub trait ImageDtype: Copy + Default + Into<f32> + Send + Sync {
    /// Convert a f32 value to the image data type.
    fn from_f32(x: f32) -> Self;
}

impl ImageDtype for f32 {
    fn from_f32(x: f32) -> Self {
        x
    }
}

// round half away from zero, then saturate; NaN maps to the lowest value
fn round_saturating<T>(x: f32) -> T
where
    T: num_traits::Bounded + num_traits::NumCast + Into<f32>,
{
    let lo: f32 = T::min_value().into();
    let hi: f32 = T::max_value().into();
    <T as num_traits::NumCast>::from(x.round().clamp(lo, hi)).unwrap_or_else(T::min_value)
}

impl ImageDtype for u8 {
    fn from_f32(x: f32) -> Self {
        round_saturating(x)
    }
}

impl ImageDtype for u16 {
    fn from_f32(x: f32) -> Self {
        round_saturating(x)
    }
}

/// Represents an image with pixel data.
///
/// The pixels are stored row-major with interleaved channels, i.e. the sample
/// of channel `c` at `(x, y)` lives at `(y * width + x) * CHANNELS + c`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use tweenflow_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::new(
    ///     ImageSize {
    ///         width: 10,
    ///         height: 20,
    ///     },
    ///     vec![0u8; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        if data.len() != size.area() * CHANNELS {
            return Err(ImageError::InvalidChannelShape(
                data.len(),
                size.area() * CHANNELS,
            ));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size filled with a single value.
    ///
    /// # Examples
    ///
    /// ```
    /// use tweenflow_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 1>::from_size_val([4, 2].into(), 7).unwrap();
    ///
    /// assert_eq!(image.as_slice(), &[7u8; 8]);
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Image::new(size, vec![val; size.area() * CHANNELS])
    }

    /// Create an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(size: ImageSize, mut f: impl FnMut(usize, usize) -> [T; CHANNELS]) -> Self
    where
        T: Copy,
    {
        let mut data = Vec::with_capacity(size.area() * CHANNELS);
        for y in 0..size.height {
            for x in 0..size.width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { size, data }
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// The raw interleaved pixel data.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The raw interleaved pixel data, mutable.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return its pixel data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get a sample by `[row, col, channel]`, or `None` when out of bounds.
    pub fn get(&self, index: [usize; 3]) -> Option<&T> {
        let [y, x, c] = index;
        if y >= self.rows() || x >= self.cols() || c >= CHANNELS {
            return None;
        }
        self.data.get((y * self.cols() + x) * CHANNELS + c)
    }

    /// Get all channels of the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// If the pixel is outside the image, an error is returned.
    pub fn pixel(&self, x: usize, y: usize) -> Result<&[T], ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }
        let base = (y * self.cols() + x) * CHANNELS;
        Ok(&self.data[base..base + CHANNELS])
    }

    /// Convert the image to `f32` samples without scaling.
    pub fn to_f32(&self) -> Image<f32, CHANNELS>
    where
        T: ImageDtype,
    {
        Image {
            size: self.size,
            data: self.data.iter().map(|&x| x.into()).collect(),
        }
    }
}

impl<const CHANNELS: usize> Image<f32, CHANNELS> {
    /// Convert `f32` samples to the pixel type `T` using [`ImageDtype::from_f32`].
    ///
    /// # Examples
    ///
    /// ```
    /// use tweenflow_image::Image;
    ///
    /// let image = Image::<f32, 1>::new([3, 1].into(), vec![12.5, 15.0, 300.0]).unwrap();
    ///
    /// assert_eq!(image.to_dtype::<u8>().as_slice(), &[13, 15, 255]);
    /// ```
    pub fn to_dtype<T: ImageDtype>(&self) -> Image<T, CHANNELS> {
        Image {
            size: self.size,
            data: self.data.iter().map(|&x| T::from_f32(x)).collect(),
        }
    }

    /// Channel-wise mean, collapsing the image to a single plane.
    pub fn mean_channels(&self) -> Image<f32, 1> {
        let norm = 1.0 / CHANNELS as f32;
        Image {
            size: self.size,
            data: self
                .data
                .chunks_exact(CHANNELS)
                .map(|px| px.iter().sum::<f32>() * norm)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::image::{Image, ImageDtype, ImageError, ImageSize};

    #[test]
    fn image_size() {
        let image_size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(image_size.area(), 200);
        assert_eq!(image_size.to_string(), "10x20");
    }

    #[test]
    fn image_smoke() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 10,
                height: 20,
            },
            vec![0u8; 10 * 20 * 3],
        )?;
        assert_eq!(image.size().width, 10);
        assert_eq!(image.size().height, 20);
        assert_eq!(image.num_channels(), 3);

        Ok(())
    }

    #[test]
    fn image_wrong_len() {
        let res = Image::<u8, 3>::new([2, 2].into(), vec![0u8; 5]);
        assert_eq!(res, Err(ImageError::InvalidChannelShape(5, 12)));
    }

    #[test]
    fn image_get_and_pixel() -> Result<(), ImageError> {
        let image = Image::<u8, 2>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0, 1, 2, 3, 4, 5, 6, 7],
        )?;
        assert_eq!(image.get([1, 0, 1]), Some(&5));
        assert_eq!(image.get([2, 0, 0]), None);
        assert_eq!(image.pixel(1, 1)?, &[6, 7]);
        assert!(image.pixel(2, 0).is_err());

        Ok(())
    }

    #[test]
    fn image_from_fn() {
        let image = Image::<u16, 1>::from_fn([3, 2].into(), |x, y| [(y * 3 + x) as u16]);
        assert_eq!(image.as_slice(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn dtype_rounding() {
        assert_eq!(u8::from_f32(12.5), 13);
        assert_eq!(u8::from_f32(17.5), 18);
        assert_eq!(u8::from_f32(14.49), 14);
        assert_eq!(u8::from_f32(-3.0), 0);
        assert_eq!(u8::from_f32(255.6), 255);
        assert_eq!(u16::from_f32(65535.9), 65535);
        assert_eq!(u8::from_f32(f32::NAN), 0);
    }

    #[test]
    fn mean_channels() -> Result<(), ImageError> {
        let image = Image::<f32, 3>::new([2, 1].into(), vec![0., 3., 6., 1., 1., 1.])?;
        assert_eq!(image.mean_channels().as_slice(), &[3.0, 1.0]);
        Ok(())
    }
}
