use common::Buffer2;

use super::orientation::block_orientation;
use crate::imgproc::Gradients;

/// Local ridge frequency per block in cycles per pixel; 0 marks an unset block.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyMap {
    pub block_size: usize,
    pub frequencies: Buffer2<f64>,
}

impl FrequencyMap {
    /// Estimate the ridge frequency of every complete block.
    ///
    /// Each block is sampled along its gradient direction, averaging along
    /// the ridges, into a 1D profile. Peaks of the centred profile at least
    /// `min_distance` apart and at least `min_height · σ` high give the
    /// frequency as the reciprocal of their mean spacing.
    pub fn estimate(
        img: &Buffer2<f32>,
        gradients: &Gradients,
        block_size: usize,
        min_distance: usize,
        min_height: f64,
    ) -> Self {
        let blocks_x = img.width() / block_size;
        let blocks_y = img.height() / block_size;
        let frequencies = Buffer2::from_fn(blocks_x, blocks_y, |bx, by| {
            let (x0, y0) = (bx * block_size, by * block_size);
            let orientation = block_orientation(gradients, x0, y0, block_size, block_size);
            let profile = block_profile(img, x0, y0, block_size, orientation.angle);
            profile_frequency(&profile, min_distance, min_height)
        });
        Self {
            block_size,
            frequencies,
        }
    }

    /// Number of blocks with a frequency estimate.
    pub fn set_count(&self) -> usize {
        self.frequencies.iter().filter(|&&f| f > 0.0).count()
    }
}

/// Mean intensity along the ridge direction for each offset along the
/// gradient direction `angle`, over a `size × size` window centred on the block.
fn block_profile(img: &Buffer2<f32>, x0: usize, y0: usize, size: usize, angle: f64) -> Vec<f64> {
    let half = (size as f64 - 1.0) * 0.5;
    let (cx, cy) = (x0 as f64 + half, y0 as f64 + half);
    let (sin_a, cos_a) = angle.sin_cos();

    (0..size)
        .map(|i| {
            let t = i as f64 - half;
            let sum: f64 = (0..size)
                .map(|j| {
                    let s = j as f64 - half;
                    let x = cx + t * cos_a - s * sin_a;
                    let y = cy + t * sin_a + s * cos_a;
                    sample_bilinear(img, x, y)
                })
                .sum();
            sum / size as f64
        })
        .collect()
}

fn sample_bilinear(img: &Buffer2<f32>, x: f64, y: f64) -> f64 {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (ix, iy) = (x0 as isize, y0 as isize);
    let at = |dx: isize, dy: isize| *img.get_clamped(ix + dx, iy + dy) as f64;
    let top = at(0, 0) * (1.0 - fx) + at(1, 0) * fx;
    let bottom = at(0, 1) * (1.0 - fx) + at(1, 1) * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Frequency of a profile from the spacing of its peaks, or 0 when fewer
/// than two peaks qualify.
pub fn profile_frequency(profile: &[f64], min_distance: usize, min_height: f64) -> f64 {
    if profile.len() < 3 {
        return 0.0;
    }
    let mean = profile.iter().sum::<f64>() / profile.len() as f64;
    let centred: Vec<f64> = profile.iter().map(|v| v - mean).collect();
    let variance = centred.iter().map(|v| v * v).sum::<f64>() / centred.len() as f64;
    let sigma = variance.sqrt();
    if sigma < 1e-9 {
        return 0.0;
    }

    let peaks = find_peaks(&centred, min_distance, min_height * sigma);
    if peaks.len() < 2 {
        return 0.0;
    }
    let spacing = (peaks[peaks.len() - 1] - peaks[0]) as f64 / (peaks.len() - 1) as f64;
    1.0 / spacing
}

/// Indices of local maxima at least `min_height` high, thinned so that no
/// two kept peaks are closer than `min_distance`; taller peaks win.
pub fn find_peaks(values: &[f64], min_distance: usize, min_height: f64) -> Vec<usize> {
    let mut candidates: Vec<usize> = (1..values.len().saturating_sub(1))
        .filter(|&i| {
            values[i] >= min_height && values[i] > values[i - 1] && values[i] >= values[i + 1]
        })
        .collect();
    candidates.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));

    let mut kept: Vec<usize> = Vec::with_capacity(candidates.len());
    for i in candidates {
        if kept.iter().all(|&k| k.abs_diff(i) >= min_distance) {
            kept.push(i);
        }
    }
    kept.sort_unstable();
    kept
}
