//! FFT phase correlation.
//!
//! Both images are centred in a square power-of-two frame, optionally Hann
//! windowed, and transformed. The normalised cross-power spectrum
//! `conj(F_ref) · F_tar / |conj(F_ref) · F_tar|` is inverted; its peak sits at
//! the shift `d` for which `target(x) ≈ reference(x − d)`.

use std::sync::Arc;

use glam::DVec2;
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Peak of a correlation surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    /// Shift `d` with `target(x) ≈ reference(x − d)`, in pixels.
    pub shift: DVec2,
    /// Height of the correlation peak; 1.0 for identical inputs.
    pub peak: f64,
}

/// Forward spectrum of an image prepared by [`PhaseCorrelator::spectrum`].
pub struct Spectrum(Vec<Complex<f32>>);

/// Phase correlator for one image size.
pub struct PhaseCorrelator {
    width: usize,
    height: usize,
    fft_size: usize,
    subpixel: bool,
    forward_fft: Arc<dyn Fft<f32>>,
    inverse_fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl PhaseCorrelator {
    pub fn new(width: usize, height: usize, use_windowing: bool, subpixel: bool) -> Self {
        let fft_size = width.max(height).max(1).next_power_of_two();

        let mut planner = FftPlanner::new();
        let forward_fft = planner.plan_fft_forward(fft_size);
        let inverse_fft = planner.plan_fft_inverse(fft_size);

        let window = if use_windowing {
            hann_window(fft_size)
        } else {
            vec![1.0; fft_size]
        };

        Self {
            width,
            height,
            fft_size,
            subpixel,
            forward_fft,
            inverse_fft,
            window,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Pad, window and transform `image`. Returns `None` on a size mismatch.
    pub fn spectrum(&self, image: &[f32]) -> Option<Spectrum> {
        if image.len() != self.width * self.height {
            return None;
        }
        let padded = self.prepare_image(image);
        Some(Spectrum(self.fft_2d(padded)))
    }

    /// Correlate two images of the correlator's size.
    pub fn correlate(&self, reference: &[f32], target: &[f32]) -> Option<Correlation> {
        let reference = self.spectrum(reference)?;
        self.correlate_spectrum(&reference, target)
    }

    /// Correlate a precomputed reference spectrum against `target`.
    pub fn correlate_spectrum(&self, reference: &Spectrum, target: &[f32]) -> Option<Correlation> {
        let target = self.spectrum(target)?;
        let cross_power = cross_power_spectrum(&reference.0, &target.0);
        let correlation = self.ifft_2d(cross_power);

        let n = self.fft_size;
        let (peak_x, peak_y, peak) = find_peak(&correlation, n);
        let mut shift = DVec2::new(wrap(peak_x, n), wrap(peak_y, n));
        if self.subpixel {
            shift += subpixel_parabolic(&correlation, n, peak_x, peak_y);
        }

        Some(Correlation {
            shift,
            peak: peak as f64,
        })
    }

    fn prepare_image(&self, image: &[f32]) -> Vec<f32> {
        let n = self.fft_size;
        let mut padded = vec![0.0f32; n * n];
        let offset_x = (n - self.width) / 2;
        let offset_y = (n - self.height) / 2;

        for (y, row) in image.chunks_exact(self.width.max(1)).enumerate() {
            let wy = self.window[y + offset_y];
            let dst = &mut padded[(y + offset_y) * n + offset_x..][..self.width];
            for (x, (out, &v)) in dst.iter_mut().zip(row).enumerate() {
                *out = v * self.window[x + offset_x] * wy;
            }
        }
        padded
    }

    fn fft_2d(&self, image: Vec<f32>) -> Vec<Complex<f32>> {
        let mut data: Vec<Complex<f32>> = image.into_iter().map(|v| Complex::new(v, 0.0)).collect();
        self.process_rows_and_columns(&mut data, &self.forward_fft);
        data
    }

    fn ifft_2d(&self, mut data: Vec<Complex<f32>>) -> Vec<f32> {
        self.process_rows_and_columns(&mut data, &self.inverse_fft);
        let norm = 1.0 / (self.fft_size * self.fft_size) as f32;
        data.iter().map(|c| c.re * norm).collect()
    }

    fn process_rows_and_columns(&self, data: &mut [Complex<f32>], fft: &Arc<dyn Fft<f32>>) {
        let n = self.fft_size;
        data.par_chunks_mut(n).for_each(|row| fft.process(row));
        transpose_inplace(data, n);
        data.par_chunks_mut(n).for_each(|row| fft.process(row));
        transpose_inplace(data, n);
    }
}

fn cross_power_spectrum(reference: &[Complex<f32>], target: &[Complex<f32>]) -> Vec<Complex<f32>> {
    reference
        .iter()
        .zip(target)
        .map(|(&r, &t)| {
            let product = r.conj() * t;
            let magnitude = product.norm();
            if magnitude > 1e-10 {
                product / magnitude
            } else {
                Complex::new(0.0, 0.0)
            }
        })
        .collect()
}

/// First maximum in row-major order.
fn find_peak(correlation: &[f32], n: usize) -> (usize, usize, f32) {
    let mut best = (0, f32::NEG_INFINITY);
    for (idx, &v) in correlation.iter().enumerate() {
        if v > best.1 {
            best = (idx, v);
        }
    }
    (best.0 % n, best.0 / n, best.1)
}

/// Peak index to signed shift; indices past the midpoint are negative.
fn wrap(peak: usize, n: usize) -> f64 {
    if peak > n / 2 {
        peak as f64 - n as f64
    } else {
        peak as f64
    }
}

/// Offset of the parabola vertex through the peak and its 4-neighbours.
fn subpixel_parabolic(correlation: &[f32], n: usize, peak_x: usize, peak_y: usize) -> DVec2 {
    let at = |x: isize, y: isize| -> f32 {
        let xx = x.rem_euclid(n as isize) as usize;
        let yy = y.rem_euclid(n as isize) as usize;
        correlation[yy * n + xx]
    };
    let (px, py) = (peak_x as isize, peak_y as isize);

    let c = at(px, py);
    let l = at(px - 1, py);
    let r = at(px + 1, py);
    let t = at(px, py - 1);
    let b = at(px, py + 1);

    let vertex = |before: f32, after: f32| -> f64 {
        let denom = 2.0 * (before + after - 2.0 * c);
        if denom.abs() > 1e-10 {
            ((before - after) / denom) as f64
        } else {
            0.0
        }
    };
    DVec2::new(vertex(l, r).clamp(-0.5, 0.5), vertex(t, b).clamp(-0.5, 0.5))
}

/// Periodic Hann window of `size` samples.
pub fn hann_window(size: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            0.5 * (1.0 - (2.0 * PI * x).cos())
        })
        .collect()
}

/// In-place square matrix transpose.
pub fn transpose_inplace<T>(data: &mut [T], n: usize) {
    for i in 0..n {
        for j in (i + 1)..n {
            data.swap(i * n + j, j * n + i);
        }
    }
}
