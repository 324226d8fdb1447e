//! Low-level image operations shared by every stage.
//!
//! Grayscale work is done on `Buffer2<f32>` intermediates and converted back
//! to 8 bits at stage boundaries. Border handling follows the usual
//! reflect-101 convention (`dcb|abcd|cba`) unless a function says otherwise.

mod clahe;
mod color;
mod filter;
mod gradient;
mod labeling;
mod morphology;
mod resize;
mod threshold;
mod warp;

#[cfg(test)]
mod tests;

pub use clahe::clahe;
pub use color::{Hsv, hsv_in_range, rgb_to_gray, rgb_to_hsv};
pub use filter::{
    gaussian_blur, gaussian_blur_f32, gaussian_kernel_1d, median_blur, median_blur_mask, unsharp,
};
pub use gradient::{Gradients, sobel};
pub use labeling::{ComponentStats, Components, label_components};
pub use morphology::{StructuringElement, close, dilate, erode, open};
pub use resize::{Bilinear, resize_bilinear, resize_nearest_mask};
pub use threshold::adaptive_threshold_gaussian;
pub use warp::{rotation_about, warp_affine};

use common::Buffer2;

use crate::image::{GrayImage, Mask};

/// Reflect-101 border index: `-1 → 1`, `n → n - 2`. Single-pixel axes clamp to 0.
#[inline]
pub(crate) fn reflect101(i: isize, n: usize) -> usize {
    debug_assert!(n > 0);
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}

#[inline]
pub(crate) fn saturate_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

pub fn to_f32(img: &GrayImage) -> Buffer2<f32> {
    img.map(|&v| v as f32)
}

/// Round and clamp every value into `0..=255`.
pub fn to_u8(img: &Buffer2<f32>) -> GrayImage {
    img.map(|&v| saturate_u8(v))
}

/// Linearly stretch the value range onto `0..=255`. A flat image maps to zeros.
pub fn normalize_min_max(img: &Buffer2<f32>) -> GrayImage {
    let (min, max) = img
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    if !range.is_finite() || range <= f32::EPSILON {
        return Buffer2::new_default(img.width(), img.height());
    }
    let scale = 255.0 / range;
    img.map(|&v| saturate_u8((v - min) * scale))
}

/// Threshold at 128: the binary images produced here are strictly 0/255.
pub fn binary_to_mask(img: &GrayImage) -> Mask {
    Mask::from_fn(img.width(), img.height(), |x, y| img[(x, y)] >= 128)
}

/// Zero every pixel whose mask bit is clear.
pub fn apply_mask<T: Copy + Default>(img: &Buffer2<T>, mask: &Mask) -> Buffer2<T> {
    assert_eq!(img.dimensions(), mask.dimensions(), "mask size mismatch");
    Buffer2::new(
        img.width(),
        img.height(),
        img.iter()
            .zip(mask.iter())
            .map(|(&v, keep)| if keep { v } else { T::default() })
            .collect(),
    )
}

/// Mean of the pixels inside `[x0, x1) × [y0, y1)`; 0 for an empty rectangle.
pub fn region_mean(img: &GrayImage, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
    let count = (x1.saturating_sub(x0)) * (y1.saturating_sub(y0));
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = (y0..y1)
        .map(|y| img.row(y)[x0..x1].iter().map(|&v| v as u64).sum::<u64>())
        .sum();
    sum as f64 / count as f64
}
