//! Gaussian and median smoothing.

use common::Buffer2;
use common::parallel::ParRowsMutAuto;
use rayon::prelude::*;

use super::{reflect101, to_f32, to_u8};
use crate::image::{GrayImage, Mask};

/// Sampled, normalised 1D Gaussian.
///
/// `ksize == 0` derives the size from sigma; `sigma <= 0` derives sigma from
/// the size as `0.3 * ((ksize - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel_1d(ksize: usize, sigma: f64) -> Vec<f32> {
    assert!(
        ksize > 0 || sigma > 0.0,
        "Either kernel size or sigma must be positive"
    );
    let ksize = if ksize == 0 {
        ((sigma * 6.0 + 1.0).round() as usize) | 1
    } else {
        ksize
    };
    assert!(ksize % 2 == 1, "Kernel size must be odd, got {}", ksize);

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };

    let radius = (ksize / 2) as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (0..ksize)
        .map(|i| {
            let x = i as f64 - radius;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel.into_iter().map(|v| v as f32).collect()
}

/// Separable Gaussian blur with reflect-101 borders.
pub fn gaussian_blur_f32(img: &Buffer2<f32>, ksize: usize, sigma: f64) -> Buffer2<f32> {
    let (width, height) = img.dimensions();
    if img.is_empty() {
        return img.clone();
    }
    let kernel = gaussian_kernel_1d(ksize, sigma);
    let radius = (kernel.len() / 2) as isize;

    let mut temp: Buffer2<f32> = Buffer2::new_default(width, height);
    temp.pixels_mut()
        .par_rows_mut_auto(width)
        .for_each(|(y_start, chunk)| {
            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let in_row = img.row(y_start + local_y);
                for (x, out) in out_row.iter_mut().enumerate() {
                    *out = kernel
                        .iter()
                        .enumerate()
                        .map(|(k, &w)| {
                            let sx = reflect101(x as isize + k as isize - radius, width);
                            in_row[sx] * w
                        })
                        .sum();
                }
            }
        });

    let mut output: Buffer2<f32> = Buffer2::new_default(width, height);
    output
        .pixels_mut()
        .par_rows_mut_auto(width)
        .for_each(|(y_start, chunk)| {
            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = (y_start + local_y) as isize;
                out_row.fill(0.0);
                for (k, &w) in kernel.iter().enumerate() {
                    let src_row = temp.row(reflect101(y + k as isize - radius, height));
                    for (out, &v) in out_row.iter_mut().zip(src_row) {
                        *out += v * w;
                    }
                }
            }
        });

    output
}

pub fn gaussian_blur(img: &GrayImage, ksize: usize, sigma: f64) -> GrayImage {
    to_u8(&gaussian_blur_f32(&to_f32(img), ksize, sigma))
}

/// Median over a `ksize × ksize` window with replicated borders.
pub fn median_blur(img: &GrayImage, ksize: usize) -> GrayImage {
    assert!(ksize % 2 == 1, "Median kernel size must be odd, got {}", ksize);
    let (width, height) = img.dimensions();
    if img.is_empty() || ksize == 1 {
        return img.clone();
    }
    let radius = (ksize / 2) as isize;
    let mid = ksize * ksize / 2;

    let mut output: GrayImage = Buffer2::new_default(width, height);
    output
        .pixels_mut()
        .par_rows_mut_auto(width)
        .for_each(|(y_start, chunk)| {
            let mut window = Vec::with_capacity(ksize * ksize);
            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = (y_start + local_y) as isize;
                for (x, out) in out_row.iter_mut().enumerate() {
                    window.clear();
                    for dy in -radius..=radius {
                        for dx in -radius..=radius {
                            window.push(*img.get_clamped(x as isize + dx, y + dy));
                        }
                    }
                    let (_, median, _) = window.select_nth_unstable(mid);
                    *out = *median;
                }
            }
        });

    output
}

/// Median of a binary mask: a pixel stays set when the majority of its
/// replicated-border window is set.
pub fn median_blur_mask(mask: &Mask, ksize: usize) -> Mask {
    assert!(ksize % 2 == 1, "Median kernel size must be odd, got {}", ksize);
    let (width, height) = mask.dimensions();
    if mask.is_empty() || ksize == 1 {
        return mask.clone();
    }
    let radius = (ksize / 2) as isize;
    let majority = ksize * ksize / 2;
    let clamp = |v: isize, n: usize| v.clamp(0, n as isize - 1) as usize;

    Mask::from_fn(width, height, |x, y| {
        let mut count = 0;
        for dy in -radius..=radius {
            let sy = clamp(y as isize + dy, height);
            for dx in -radius..=radius {
                if mask.get_xy(clamp(x as isize + dx, width), sy) {
                    count += 1;
                }
            }
        }
        count > majority
    })
}

/// `amount * img - (amount - 1) * blurred`, i.e. an unsharp mask.
pub fn unsharp(img: &Buffer2<f32>, blurred: &Buffer2<f32>, amount: f32) -> Buffer2<f32> {
    Buffer2::new(
        img.width(),
        img.height(),
        img.iter()
            .zip(blurred.iter())
            .map(|(&v, &b)| amount * v - (amount - 1.0) * b)
            .collect(),
    )
}
