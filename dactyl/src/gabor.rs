//! Even-symmetric Gabor filter bank.
//!
//! Kernels have their mean removed, so flat regions respond with zero and an
//! intensity-inverted input produces the negated response.

use std::f64::consts::PI;

use common::Buffer2;
use common::parallel::ParRowsMutAuto;
use rayon::prelude::*;

use crate::config::GaborConfig;
use crate::imgproc::reflect101;

/// One oriented kernel of the bank.
#[derive(Debug, Clone)]
pub struct GaborKernel {
    /// Spatial frequency in cycles per pixel.
    pub frequency: f64,
    /// Direction of the carrier wave in radians, `[0, π)`.
    pub theta: f64,
    pub weights: Buffer2<f32>,
}

impl GaborKernel {
    pub fn new(ksize: usize, sigma: f64, theta: f64, frequency: f64, gamma: f64) -> Self {
        assert!(ksize % 2 == 1, "Gabor kernel size must be odd, got {}", ksize);
        let half = (ksize / 2) as isize;
        let (sin_t, cos_t) = theta.sin_cos();
        let two_sigma_sq = 2.0 * sigma * sigma;
        let gamma_sq = gamma * gamma;

        let mut weights = Buffer2::from_fn(ksize, ksize, |i, j| {
            let x = i as isize - half;
            let y = j as isize - half;
            let (x, y) = (x as f64, y as f64);
            let xr = x * cos_t + y * sin_t;
            let yr = -x * sin_t + y * cos_t;
            let envelope = (-(xr * xr + gamma_sq * yr * yr) / two_sigma_sq).exp();
            (envelope * (2.0 * PI * frequency * xr).cos()) as f32
        });

        let mean = weights.iter().sum::<f32>() / weights.len() as f32;
        for w in weights.iter_mut() {
            *w -= mean;
        }

        Self {
            frequency,
            theta,
            weights,
        }
    }

    /// Correlate `img` with the kernel using reflect-101 borders.
    pub fn filter(&self, img: &Buffer2<f32>) -> Buffer2<f32> {
        filter2d(img, &self.weights)
    }
}

/// Every (frequency, orientation) pair of a [`GaborConfig`], frequency-major.
#[derive(Debug, Clone)]
pub struct GaborBank {
    kernels: Vec<GaborKernel>,
}

impl GaborBank {
    pub fn new(config: &GaborConfig) -> Self {
        config.validate();
        let kernels = config
            .frequencies
            .iter()
            .flat_map(|&frequency| {
                (0..config.orientations).map(move |i| {
                    let theta = i as f64 * PI / config.orientations as f64;
                    GaborKernel::new(config.kernel_size, config.sigma, theta, frequency, config.gamma)
                })
            })
            .collect();
        Self { kernels }
    }

    pub fn kernels(&self) -> &[GaborKernel] {
        &self.kernels
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Per-pixel maximum |response| over the whole bank.
    pub fn max_abs_response(&self, img: &Buffer2<f32>) -> Buffer2<f32> {
        let (width, height) = img.dimensions();
        self.kernels
            .par_iter()
            .map(|k| k.filter(img))
            .fold(
                || Buffer2::new_default(width, height),
                |mut acc: Buffer2<f32>, response| {
                    for (a, &r) in acc.iter_mut().zip(response.iter()) {
                        *a = a.max(r.abs());
                    }
                    acc
                },
            )
            .reduce(
                || Buffer2::new_default(width, height),
                |mut a, b| {
                    for (x, &y) in a.iter_mut().zip(b.iter()) {
                        *x = x.max(y);
                    }
                    a
                },
            )
    }
}

/// Dense 2D correlation with reflect-101 borders, row-parallel.
pub fn filter2d(img: &Buffer2<f32>, kernel: &Buffer2<f32>) -> Buffer2<f32> {
    let (width, height) = img.dimensions();
    let mut output = Buffer2::new_default(width, height);
    if img.is_empty() {
        return output;
    }
    let (kw, kh) = kernel.dimensions();
    let (rx, ry) = ((kw / 2) as isize, (kh / 2) as isize);

    output
        .pixels_mut()
        .par_rows_mut_auto(width)
        .for_each(|(y_start, chunk)| {
            let mut columns = vec![0usize; kw];
            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = (y_start + local_y) as isize;
                for (x, out) in out_row.iter_mut().enumerate() {
                    for (kx, c) in columns.iter_mut().enumerate() {
                        *c = reflect101(x as isize + kx as isize - rx, width);
                    }
                    let mut sum = 0.0f32;
                    for ky in 0..kh {
                        let src = img.row(reflect101(y + ky as isize - ry, height));
                        let weights = kernel.row(ky);
                        for (&w, &c) in weights.iter().zip(&columns) {
                            sum += w * src[c];
                        }
                    }
                    *out = sum;
                }
            }
        });

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripes(size: usize, period: f64, vertical: bool) -> Buffer2<f32> {
        Buffer2::from_fn(size, size, |x, y| {
            let t = if vertical { x } else { y } as f64;
            (128.0 + 100.0 * (2.0 * PI * t / period).cos()) as f32
        })
    }

    #[test]
    fn test_kernel_is_zero_mean() {
        let k = GaborKernel::new(15, 3.5, 0.7, 0.1, 0.5);
        let sum: f32 = k.weights.iter().sum();
        assert!(sum.abs() < 1e-4, "sum {}", sum);
    }

    #[test]
    fn test_flat_image_has_no_response() {
        let k = GaborKernel::new(15, 3.5, 0.0, 0.1, 0.5);
        let out = k.filter(&Buffer2::new_filled(32, 32, 90.0));
        assert!(out.iter().all(|v| v.abs() < 1e-2));
    }

    #[test]
    fn test_matching_orientation_responds_strongest() {
        // vertical stripes vary along x: carrier direction theta = 0
        let img = stripes(48, 10.0, true);
        let along = GaborKernel::new(15, 3.5, 0.0, 0.1, 0.5).filter(&img);
        let across = GaborKernel::new(15, 3.5, PI / 2.0, 0.1, 0.5).filter(&img);
        let energy = |b: &Buffer2<f32>| b.iter().map(|v| v.abs()).sum::<f32>();
        assert!(energy(&along) > 5.0 * energy(&across));
    }

    #[test]
    fn test_inverted_input_negates_response() {
        let img = stripes(32, 8.0, false);
        let inverted = img.map(|&v| 255.0 - v);
        let k = GaborKernel::new(15, 3.5, PI / 2.0, 0.12, 0.5);
        let a = k.filter(&img);
        let b = k.filter(&inverted);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x + y).abs() < 1e-2);
        }
    }

    #[test]
    fn test_bank_size_and_max_response() {
        let config = GaborConfig {
            frequencies: vec![0.08, 0.1],
            orientations: 4,
            kernel_size: 11,
            sigma: 3.0,
            gamma: 0.5,
        };
        let bank = GaborBank::new(&config);
        assert_eq!(bank.len(), 8);
        assert!((bank.kernels()[5].theta - PI / 4.0).abs() < 1e-12);
        assert_eq!(bank.kernels()[5].frequency, 0.1);

        let img = stripes(24, 10.0, true);
        let max = bank.max_abs_response(&img);
        let single = bank.kernels()[1].filter(&img);
        for (m, s) in max.iter().zip(single.iter()) {
            assert!(*m >= s.abs());
        }
    }

    #[test]
    fn test_filter2d_identity_kernel() {
        let mut kernel = Buffer2::new_default(3, 3);
        kernel[(1, 1)] = 1.0f32;
        let img = Buffer2::from_fn(7, 5, |x, y| (x * 3 + y) as f32);
        assert_eq!(filter2d(&img, &kernel), img);
    }
}
