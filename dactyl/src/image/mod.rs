//! In-memory image types.
//!
//! Grayscale and colour images are plain [`Buffer2`] grids; masks are
//! bit-packed [`BitBuffer2`]s with the same dimensions as the image they gate.
//! Every processing stage takes images by reference and returns new ones.

mod error;
mod io;
mod roi;


pub use common::{BitBuffer2, Buffer2};
pub use error::ImageError;
pub use io::{gray_to_dynamic, mask_to_gray};
pub use roi::Roi;

/// 8-bit single-channel image.
pub type GrayImage = Buffer2<u8>;

/// 8-bit RGB image.
pub type ColorImage = Buffer2<[u8; 3]>;

/// Per-pixel foreground flags.
pub type Mask = BitBuffer2;

/// Channel layout of a raw interleaved byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Gray8,
    Rgb8,
    Rgba8,
    Bgr8,
    Bgra8,
}

impl PixelFormat {
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }
}

/// A capture or stored sample, either grayscale or colour.
#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    Gray(GrayImage),
    Color(ColorImage),
}

impl Image {
    /// Decode an interleaved 8-bit buffer. Alpha is dropped, BGR orders are swizzled to RGB.
    pub fn from_raw(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<Self, ImageError> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
            .ok_or(ImageError::DimensionOverflow { width, height })?;

        if data.len() != expected {
            return Err(ImageError::BufferSizeMismatch {
                width,
                height,
                format,
                expected,
                actual: data.len(),
            });
        }

        let bpp = format.bytes_per_pixel();
        let image = match format {
            PixelFormat::Gray8 => Image::Gray(Buffer2::new(width, height, data.to_vec())),
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => Image::Color(Buffer2::new(
                width,
                height,
                data.chunks_exact(bpp).map(|p| [p[0], p[1], p[2]]).collect(),
            )),
            PixelFormat::Bgr8 | PixelFormat::Bgra8 => Image::Color(Buffer2::new(
                width,
                height,
                data.chunks_exact(bpp).map(|p| [p[2], p[1], p[0]]).collect(),
            )),
        };
        Ok(image)
    }

    #[inline]
    pub fn width(&self) -> usize {
        match self {
            Image::Gray(img) => img.width(),
            Image::Color(img) => img.width(),
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        match self {
            Image::Gray(img) => img.height(),
            Image::Color(img) => img.height(),
        }
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Luma view of the image; grayscale input is cloned as is.
    pub fn to_gray(&self) -> GrayImage {
        match self {
            Image::Gray(img) => img.clone(),
            Image::Color(img) => crate::imgproc::rgb_to_gray(img),
        }
    }

    /// Colour view of the image; grayscale input is replicated into three channels.
    pub fn to_color(&self) -> ColorImage {
        match self {
            Image::Gray(img) => img.map(|&v| [v, v, v]),
            Image::Color(img) => img.clone(),
        }
    }
}

impl From<GrayImage> for Image {
    fn from(img: GrayImage) -> Self {
        Image::Gray(img)
    }
}

impl From<ColorImage> for Image {
    fn from(img: ColorImage) -> Self {
        Image::Color(img)
    }
}
