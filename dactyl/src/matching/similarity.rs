//! Per-family similarity functions, each in `[0, 1]`.
//!
//! Degenerate inputs (nothing to compare, zero norm, zero variance) give the
//! neutral value [`NEUTRAL`] instead of NaN.

use std::f64::consts::FRAC_PI_2;

use common::{Buffer2, FloatExt};

use crate::features::{FrequencyMap, OrientationField, angular_difference};

pub const NEUTRAL: f64 = 0.5;

const MIN_NORM: f64 = 1e-12;

/// `1 − mean angular difference / (π/2)` over co-located blocks, weighted by
/// the product of both coherences. Blocks at or below `min_coherence` in
/// either field are skipped.
pub fn orientation_similarity(a: &OrientationField, b: &OrientationField, min_coherence: f64) -> f64 {
    let width = a.blocks.width().min(b.blocks.width());
    let height = a.blocks.height().min(b.blocks.height());

    let mut weighted_diff = 0.0;
    let mut total_weight = 0.0;
    for y in 0..height {
        for x in 0..width {
            let (ba, bb) = (a.blocks[(x, y)], b.blocks[(x, y)]);
            if ba.coherence <= min_coherence || bb.coherence <= min_coherence {
                continue;
            }
            let weight = ba.coherence * bb.coherence;
            weighted_diff += weight * angular_difference(ba.angle, bb.angle);
            total_weight += weight;
        }
    }

    if total_weight <= 0.0 {
        return NEUTRAL;
    }
    (1.0 - (weighted_diff / total_weight) / FRAC_PI_2).clamp(0.0, 1.0)
}

/// Cosine similarity clamped at 0. Vectors of different length or with a
/// near-zero norm are neutral.
pub fn vector_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return NEUTRAL;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a < MIN_NORM || norm_b < MIN_NORM {
        return NEUTRAL;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0).or_if_nan(NEUTRAL)
}

/// Correlation of two frequency maps over the blocks set in both, each map
/// divided by its own mean first, rescaled from `[-1, 1]` to `[0, 1]`.
pub fn frequency_similarity(a: &FrequencyMap, b: &FrequencyMap) -> f64 {
    let width = a.frequencies.width().min(b.frequencies.width());
    let height = a.frequencies.height().min(b.frequencies.height());

    let mut pairs = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let (fa, fb) = (a.frequencies[(x, y)], b.frequencies[(x, y)]);
            if fa > 0.0 && fb > 0.0 {
                pairs.push((fa, fb));
            }
        }
    }
    if pairs.len() < 2 {
        return NEUTRAL;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let xs: Vec<f64> = pairs.iter().map(|p| p.0 / mean_a).collect();
    let ys: Vec<f64> = pairs.iter().map(|p| p.1 / mean_b).collect();

    match ncc(&xs, &ys) {
        Some(r) => ((r + 1.0) * 0.5).clamp(0.0, 1.0),
        None => NEUTRAL,
    }
}

/// Zero-mean NCC of two equally sized images, floored at 0.
pub fn pixel_similarity(a: &Buffer2<u8>, b: &Buffer2<u8>) -> f64 {
    if a.dimensions() != b.dimensions() || a.is_empty() {
        return NEUTRAL;
    }
    let xs: Vec<f64> = a.iter().map(|&v| v as f64).collect();
    let ys: Vec<f64> = b.iter().map(|&v| v as f64).collect();
    match ncc(&xs, &ys) {
        Some(r) => r.max(0.0),
        None => NEUTRAL,
    }
}

/// Pearson correlation; `None` when either side has no variance.
fn ncc(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom < MIN_NORM {
        return None;
    }
    let r = (sxy / denom).clamp(-1.0, 1.0);
    (!r.is_nan()).then_some(r)
}
