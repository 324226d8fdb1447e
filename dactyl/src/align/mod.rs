//! Rotation search plus phase-correlation alignment of ridge images.

mod phase;

#[cfg(test)]
mod tests;

use glam::{DAffine2, DVec2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use phase::{hann_window, Correlation, PhaseCorrelator};

use crate::config::AlignConfig;
use crate::image::GrayImage;
use crate::imgproc::{rotation_about, to_f32, warp_affine};

/// Transform that maps a target onto its reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// Rotation applied to the target about its centre, in degrees.
    pub rotation_degrees: f64,
    /// Shift measured after rotation; the target is moved by `-translation`.
    pub translation: DVec2,
    /// Phase-correlation peak of the chosen rotation.
    pub peak: f64,
}

impl Alignment {
    pub fn identity() -> Self {
        Self {
            rotation_degrees: 0.0,
            translation: DVec2::ZERO,
            peak: 0.0,
        }
    }

    /// Forward transform for a target whose centre is `target_center`.
    pub fn transform(&self, target_center: DVec2) -> DAffine2 {
        DAffine2::from_translation(-self.translation)
            * rotation_about(target_center, self.rotation_degrees)
    }
}

/// Target resampled into the reference frame.
#[derive(Debug, Clone)]
pub struct AlignedImage {
    pub image: GrayImage,
    pub alignment: Alignment,
}

/// Greedy rotation search with phase correlation at each angle.
#[derive(Debug, Clone)]
pub struct Aligner {
    config: AlignConfig,
    angles: Vec<f64>,
}

impl Aligner {
    pub fn new(config: AlignConfig) -> Self {
        config.validate();
        let angles = config.angles();
        Self { config, angles }
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    /// Align `target` onto `reference`. The output has the reference's size.
    ///
    /// Empty inputs give the identity alignment and a blank image.
    pub fn align(&self, reference: &GrayImage, target: &GrayImage) -> AlignedImage {
        let (width, height) = reference.dimensions();
        if reference.is_empty() || target.is_empty() {
            tracing::debug!("Empty image passed to alignment, using identity");
            return AlignedImage {
                image: GrayImage::new_default(width, height),
                alignment: Alignment::identity(),
            };
        }

        let correlator = PhaseCorrelator::new(
            width,
            height,
            self.config.use_windowing,
            self.config.subpixel,
        );
        let reference_f32 = to_f32(reference);
        let Some(spectrum) = correlator.spectrum(&reference_f32) else {
            return AlignedImage {
                image: GrayImage::new_default(width, height),
                alignment: Alignment::identity(),
            };
        };

        let center = target_center(target);
        let trials: Vec<Option<(f64, Correlation)>> = self
            .angles()
            .par_iter()
            .map(|&angle| {
                let rotated = warp_affine(target, &rotation_about(center, angle), width, height);
                correlator
                    .correlate_spectrum(&spectrum, &to_f32(&rotated))
                    .map(|c| (angle, c))
            })
            .collect();

        // First best in angle order keeps ties deterministic.
        let mut best: Option<(f64, Correlation)> = None;
        for (angle, correlation) in trials.into_iter().flatten() {
            if best.map_or(true, |(_, b)| correlation.peak > b.peak) {
                best = Some((angle, correlation));
            }
        }

        let alignment = match best {
            Some((angle, correlation)) => Alignment {
                rotation_degrees: angle,
                translation: correlation.shift,
                peak: correlation.peak,
            },
            None => Alignment::identity(),
        };
        tracing::debug!(
            "Aligned: rotation {:.1} deg, shift ({:.2}, {:.2}), peak {:.4}",
            alignment.rotation_degrees,
            alignment.translation.x,
            alignment.translation.y,
            alignment.peak
        );

        let image = warp_affine(target, &alignment.transform(center), width, height);
        AlignedImage { image, alignment }
    }

    fn angles(&self) -> &[f64] {
        &self.angles
    }
}

impl Default for Aligner {
    fn default() -> Self {
        Self::new(AlignConfig::default())
    }
}

fn target_center(image: &GrayImage) -> DVec2 {
    DVec2::new(image.width() as f64 * 0.5, image.height() as f64 * 0.5)
}
