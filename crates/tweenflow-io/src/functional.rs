use std::path::Path;

use image::{ColorType, DynamicImage, ImageBuffer, ImageDecoder};
use tweenflow_image::{Image, ImageDtype, ImageSize};

use crate::error::IoError;

/// Size, channel count and sample depth of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    /// Width and height in pixels.
    pub size: ImageSize,
    /// Samples per pixel.
    pub channels: usize,
    /// Bits per sample.
    pub bit_depth: usize,
}

impl ImageLayout {
    /// Layout of an in-memory image with `C` channels of type `T`.
    pub fn of<T, const C: usize>(image: &Image<T, C>) -> Self {
        Self {
            size: image.size(),
            channels: C,
            bit_depth: 8 * std::mem::size_of::<T>(),
        }
    }

    fn from_color(size: ImageSize, color: ColorType) -> Self {
        let channels = color.channel_count() as usize;
        Self {
            size,
            channels,
            bit_depth: 8 * color.bytes_per_pixel() as usize / channels.max(1),
        }
    }
}

impl std::fmt::Display for ImageLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} with {} channel(s) of {} bits",
            self.size, self.channels, self.bit_depth
        )
    }
}

/// Pixel depths that can be stored in an image file.
///
/// Implemented for 8-bit and 16-bit samples with 1 (gray), 2 (gray + alpha),
/// 3 (RGB) or 4 (RGBA) channels.
pub trait FileDtype: ImageDtype {
    /// Bits per sample in a file.
    const BIT_DEPTH: usize;

    /// Convert a decoded image into interleaved samples with `C` channels.
    fn from_dynamic<const C: usize>(img: DynamicImage) -> Result<Vec<Self>, IoError>;

    /// Wrap interleaved samples with `C` channels into an encodable image.
    fn to_dynamic<const C: usize>(image: &Image<Self, C>) -> Result<DynamicImage, IoError>;
}

impl FileDtype for u8 {
    const BIT_DEPTH: usize = 8;

    fn from_dynamic<const C: usize>(img: DynamicImage) -> Result<Vec<Self>, IoError> {
        Ok(match C {
            1 => img.into_luma8().into_raw(),
            2 => img.into_luma_alpha8().into_raw(),
            3 => img.into_rgb8().into_raw(),
            4 => img.into_rgba8().into_raw(),
            _ => return Err(IoError::UnsupportedChannels(C)),
        })
    }

    fn to_dynamic<const C: usize>(image: &Image<Self, C>) -> Result<DynamicImage, IoError> {
        let size = image.size();
        let (w, h) = (size.width as u32, size.height as u32);
        let buf = image.as_slice().to_vec();
        let invalid = || IoError::InvalidBuffer(size);

        Ok(match C {
            1 => DynamicImage::ImageLuma8(ImageBuffer::from_raw(w, h, buf).ok_or_else(invalid)?),
            2 => DynamicImage::ImageLumaA8(ImageBuffer::from_raw(w, h, buf).ok_or_else(invalid)?),
            3 => DynamicImage::ImageRgb8(ImageBuffer::from_raw(w, h, buf).ok_or_else(invalid)?),
            4 => DynamicImage::ImageRgba8(ImageBuffer::from_raw(w, h, buf).ok_or_else(invalid)?),
            _ => return Err(IoError::UnsupportedChannels(C)),
        })
    }
}

impl FileDtype for u16 {
    const BIT_DEPTH: usize = 16;

    fn from_dynamic<const C: usize>(img: DynamicImage) -> Result<Vec<Self>, IoError> {
        Ok(match C {
            1 => img.into_luma16().into_raw(),
            2 => img.into_luma_alpha16().into_raw(),
            3 => img.into_rgb16().into_raw(),
            4 => img.into_rgba16().into_raw(),
            _ => return Err(IoError::UnsupportedChannels(C)),
        })
    }

    fn to_dynamic<const C: usize>(image: &Image<Self, C>) -> Result<DynamicImage, IoError> {
        let size = image.size();
        let (w, h) = (size.width as u32, size.height as u32);
        let buf = image.as_slice().to_vec();
        let invalid = || IoError::InvalidBuffer(size);

        Ok(match C {
            1 => DynamicImage::ImageLuma16(ImageBuffer::from_raw(w, h, buf).ok_or_else(invalid)?),
            2 => {
                DynamicImage::ImageLumaA16(ImageBuffer::from_raw(w, h, buf).ok_or_else(invalid)?)
            }
            3 => DynamicImage::ImageRgb16(ImageBuffer::from_raw(w, h, buf).ok_or_else(invalid)?),
            4 => {
                DynamicImage::ImageRgba16(ImageBuffer::from_raw(w, h, buf).ok_or_else(invalid)?)
            }
            _ => return Err(IoError::UnsupportedChannels(C)),
        })
    }
}

/// Reads an image of any supported format from the given file path.
///
/// The file must hold exactly `C` channels of `T::BIT_DEPTH` bits; the
/// samples are never converted.
///
/// # Arguments
///
/// * `file_path` - The path to the image.
///
/// # Errors
///
/// Returns [`IoError::LayoutMismatch`] if the file has another channel count
/// or sample depth.
///
/// # Returns
///
/// An image with the decoded pixel data.
pub fn read_image_any<T: FileDtype, const C: usize>(
    file_path: impl AsRef<Path>,
) -> Result<Image<T, C>, IoError> {
    let file_path = file_path.as_ref();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let img = image::ImageReader::open(file_path)?
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    let found = ImageLayout::from_color(size, img.color());
    let expected = ImageLayout {
        size,
        channels: C,
        bit_depth: T::BIT_DEPTH,
    };
    if found != expected {
        return Err(IoError::LayoutMismatch { expected, found });
    }

    log::debug!("decoded {} ({found})", file_path.display());

    Ok(Image::new(size, T::from_dynamic::<C>(img)?)?)
}

/// Reads the layout of an image file without decoding its pixels.
///
/// # Arguments
///
/// * `file_path` - The path to the image.
pub fn read_image_layout(file_path: impl AsRef<Path>) -> Result<ImageLayout, IoError> {
    let file_path = file_path.as_ref();

    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let decoder = image::ImageReader::open(file_path)?
        .with_guessed_format()?
        .into_decoder()?;
    let (width, height) = decoder.dimensions();
    let size = ImageSize {
        width: width as usize,
        height: height as usize,
    };

    Ok(ImageLayout::from_color(size, decoder.color_type()))
}

/// Writes an image to the given file path.
///
/// The format is chosen from the file extension.
///
/// # Arguments
///
/// * `file_path` - The destination path.
/// * `image` - The image to encode.
pub fn write_image_any<T: FileDtype, const C: usize>(
    file_path: impl AsRef<Path>,
    image: &Image<T, C>,
) -> Result<(), IoError> {
    let file_path = file_path.as_ref();
    T::to_dynamic(image)?.save(file_path)?;
    log::debug!("encoded {} ({})", file_path.display(), image.size());
    Ok(())
}
