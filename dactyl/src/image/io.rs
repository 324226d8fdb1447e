//! Conversions to and from the `image` crate.

use image::{DynamicImage, GrayImage as ImgGray, RgbImage};

use super::{Buffer2, ColorImage, GrayImage, Image, Mask};

impl From<DynamicImage> for Image {
    fn from(dynamic: DynamicImage) -> Self {
        match dynamic {
            DynamicImage::ImageLuma8(gray) => {
                let (w, h) = (gray.width() as usize, gray.height() as usize);
                Image::Gray(Buffer2::new(w, h, gray.into_raw()))
            }
            other => {
                let rgb = other.into_rgb8();
                let (w, h) = (rgb.width() as usize, rgb.height() as usize);
                let pixels = rgb
                    .into_raw()
                    .chunks_exact(3)
                    .map(|p| [p[0], p[1], p[2]])
                    .collect();
                Image::Color(Buffer2::new(w, h, pixels))
            }
        }
    }
}

impl From<&Image> for DynamicImage {
    fn from(img: &Image) -> Self {
        match img {
            Image::Gray(gray) => gray_to_dynamic(gray),
            Image::Color(color) => color_to_dynamic(color),
        }
    }
}

pub fn gray_to_dynamic(gray: &GrayImage) -> DynamicImage {
    let buffer = ImgGray::from_raw(
        gray.width() as u32,
        gray.height() as u32,
        gray.pixels().to_vec(),
    )
    .unwrap_or_else(|| ImgGray::new(gray.width() as u32, gray.height() as u32));
    DynamicImage::ImageLuma8(buffer)
}

fn color_to_dynamic(color: &ColorImage) -> DynamicImage {
    let raw: Vec<u8> = color.iter().flat_map(|p| p.iter().copied()).collect();
    let buffer = RgbImage::from_raw(color.width() as u32, color.height() as u32, raw)
        .unwrap_or_else(|| RgbImage::new(color.width() as u32, color.height() as u32));
    DynamicImage::ImageRgb8(buffer)
}

/// Render a mask as a 0/255 grayscale image, e.g. for a UI overlay.
pub fn mask_to_gray(mask: &Mask) -> GrayImage {
    Buffer2::new(
        mask.width(),
        mask.height(),
        mask.iter().map(|set| if set { 255 } else { 0 }).collect(),
    )
}
