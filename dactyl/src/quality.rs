//! Capture quality heuristics and the stability gate that decides when a
//! preview frame is good enough to capture.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::{QualityConfig, StabilityConfig};
use crate::image::{GrayImage, Mask, Roi};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureQuality {
    /// Variance of the 4-neighbour Laplacian.
    pub sharpness: f64,
    /// Intensity standard deviation.
    pub contrast: f64,
    /// Fraction of the frame covered by the mask.
    pub coverage: f64,
    /// Weighted score in `[0, 100]`.
    pub score: f64,
}

/// Measure sharpness, contrast and coverage over the pixels selected by
/// `mask`, or the whole frame without one.
///
/// A mask with mismatched dimensions is ignored.
pub fn assess_quality(gray: &GrayImage, mask: Option<&Mask>, config: &QualityConfig) -> CaptureQuality {
    let mask = mask.filter(|m| m.dimensions() == gray.dimensions());
    let (width, height) = gray.dimensions();
    let selected = |x: usize, y: usize| mask.map_or(true, |m| m.get_xy(x, y));

    let mut intensity = Moments::default();
    let mut laplacian = Moments::default();
    for y in 0..height {
        for x in 0..width {
            if !selected(x, y) {
                continue;
            }
            let v = gray[(x, y)] as f64;
            intensity.push(v);
            if x > 0 && y > 0 && x + 1 < width && y + 1 < height {
                let l = gray[(x - 1, y)] as f64
                    + gray[(x + 1, y)] as f64
                    + gray[(x, y - 1)] as f64
                    + gray[(x, y + 1)] as f64
                    - 4.0 * v;
                laplacian.push(l);
            }
        }
    }

    let coverage = if gray.is_empty() {
        0.0
    } else {
        intensity.count as f64 / gray.len() as f64
    };
    let sharpness = laplacian.variance();
    let contrast = intensity.variance().sqrt();

    let score = 100.0
        * (config.sharpness_weight * (sharpness / config.sharpness_reference).min(1.0)
            + config.contrast_weight * (contrast / config.contrast_reference).min(1.0)
            + config.coverage_weight * (coverage / config.coverage_reference).min(1.0));

    CaptureQuality {
        sharpness,
        contrast,
        coverage,
        score: score.clamp(0.0, 100.0),
    }
}

#[derive(Debug, Default)]
struct Moments {
    count: usize,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    fn push(&mut self, v: f64) {
        self.count += 1;
        self.sum += v;
        self.sum_sq += v * v;
    }

    fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.sum / self.count as f64;
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0)
    }
}

/// Fires once a run of consecutive frames scores high enough while the ROI
/// stays put. The streak restarts after firing.
#[derive(Debug, Clone)]
pub struct StabilityGate {
    config: StabilityConfig,
    streak: usize,
    last_center: Option<DVec2>,
}

impl StabilityGate {
    pub fn new(config: StabilityConfig) -> Self {
        config.validate();
        Self {
            config,
            streak: 0,
            last_center: None,
        }
    }

    pub fn streak(&self) -> usize {
        self.streak
    }

    pub fn reset(&mut self) {
        self.streak = 0;
        self.last_center = None;
    }

    /// Feed one frame; returns `true` when the gate fires.
    pub fn push(&mut self, score: f64, roi: Roi) -> bool {
        let (cx, cy) = roi.center();
        let center = DVec2::new(cx, cy);

        if score < self.config.min_score {
            self.reset();
            return false;
        }

        let steady = self
            .last_center
            .map_or(true, |last| last.distance(center) <= self.config.max_drift_px);
        self.streak = if steady { self.streak + 1 } else { 1 };
        self.last_center = Some(center);

        if self.streak >= self.config.required_frames {
            tracing::debug!("Stability gate fired after {} frames", self.streak);
            self.reset();
            return true;
        }
        false
    }
}

impl Default for StabilityGate {
    fn default() -> Self {
        Self::new(StabilityConfig::default())
    }
}
