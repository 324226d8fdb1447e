use super::{gaussian_blur_f32, saturate_u8, to_f32};
use crate::image::GrayImage;

/// Binary threshold against a Gaussian-weighted local mean.
///
/// A pixel becomes 255 when it exceeds `local_mean - offset`, otherwise 0.
/// The local mean is the `block × block` Gaussian blur rounded to 8 bits.
/// A negative `offset` therefore demands pixels brighter than their
/// neighbourhood.
pub fn adaptive_threshold_gaussian(img: &GrayImage, block: usize, offset: f64) -> GrayImage {
    assert!(
        block % 2 == 1 && block > 1,
        "Adaptive threshold block size must be odd and > 1, got {}",
        block
    );
    if img.is_empty() {
        return img.clone();
    }
    let mean = gaussian_blur_f32(&to_f32(img), block, 0.0);

    let mut output = img.clone();
    for (out, &m) in output.iter_mut().zip(mean.iter()) {
        let local = saturate_u8(m) as f64;
        *out = if *out as f64 > local - offset { 255 } else { 0 };
    }
    output
}
