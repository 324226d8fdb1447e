use common::Buffer2;
use rayon::prelude::*;

use crate::gabor::GaborBank;
use crate::imgproc::Gradients;

/// `[mean, std, percentile |response|]` for every kernel of `bank`, in bank order.
pub fn gabor_energy(img: &Buffer2<f32>, bank: &GaborBank, percentile: f64) -> Vec<f64> {
    if img.is_empty() {
        return vec![0.0; bank.len() * 3];
    }
    bank.kernels()
        .par_iter()
        .map(|kernel| {
            let response = kernel.filter(img);
            let (mean, std) = mean_std(response.iter().map(|&v| v as f64));
            let mut magnitudes: Vec<f64> = response.iter().map(|&v| (v as f64).abs()).collect();
            [mean, std, percentile_of(&mut magnitudes, percentile)]
        })
        .collect::<Vec<_>>()
        .concat()
}

/// `[mean, std, mean |gx|, mean |gy|]` for each cell of a `grid × grid` partition.
///
/// Cells are laid out row-major; an empty cell contributes zeros.
pub fn texture_stats(img: &Buffer2<f32>, gradients: &Gradients, grid: usize) -> Vec<f64> {
    let (width, height) = img.dimensions();
    let mut features = Vec::with_capacity(grid * grid * 4);
    for gy in 0..grid {
        let (y0, y1) = (gy * height / grid, (gy + 1) * height / grid);
        for gx in 0..grid {
            let (x0, x1) = (gx * width / grid, (gx + 1) * width / grid);
            if x0 == x1 || y0 == y1 {
                features.extend_from_slice(&[0.0; 4]);
                continue;
            }
            let count = ((x1 - x0) * (y1 - y0)) as f64;
            let (mean, std) = mean_std(cell_values(img, x0, x1, y0, y1));
            let mean_dx = cell_values(&gradients.gx, x0, x1, y0, y1)
                .map(f64::abs)
                .sum::<f64>()
                / count;
            let mean_dy = cell_values(&gradients.gy, x0, x1, y0, y1)
                .map(f64::abs)
                .sum::<f64>()
                / count;
            features.extend_from_slice(&[mean, std, mean_dx, mean_dy]);
        }
    }
    features
}

fn cell_values(
    buf: &Buffer2<f32>,
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
) -> impl Iterator<Item = f64> + '_ {
    (y0..y1).flat_map(move |y| buf.row(y)[x0..x1].iter().map(|&v| v as f64))
}

/// Population mean and standard deviation; `(0, 0)` for no values.
pub fn mean_std(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut n, mut sum, mut sum_sq) = (0usize, 0.0f64, 0.0f64);
    for v in values {
        n += 1;
        sum += v;
        sum_sq += v * v;
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    let variance = (sum_sq / n as f64 - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

/// Nearest-rank percentile, `q ∈ [0, 1]`. Reorders `values`.
pub fn percentile_of(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let idx = ((values.len() - 1) as f64 * q).round() as usize;
    let (_, v, _) = values.select_nth_unstable_by(idx, |a, b| a.total_cmp(b));
    *v
}
