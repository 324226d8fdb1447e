//! Feature families computed on the core region of a ridge image.
//!
//! - orientation field with coherence (16 px blocks)
//! - Gabor energy statistics (3 frequencies × 8 orientations × 3 stats)
//! - ridge frequency map (32 px blocks)
//! - block texture statistics (4 × 4 cells × 4 stats)

mod frequency;
mod orientation;
mod stats;


pub use frequency::{FrequencyMap, find_peaks, profile_frequency};
pub use orientation::{OrientationBlock, OrientationField, angular_difference, block_orientation};
pub use stats::{gabor_energy, mean_std, percentile_of, texture_stats};

use crate::config::FeatureConfig;
use crate::gabor::GaborBank;
use crate::image::GrayImage;
use crate::imgproc::{sobel, to_f32};

/// Everything the scorer compares for one image.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Core region the features were computed on.
    pub core: GrayImage,
    pub orientation: OrientationField,
    pub gabor: Vec<f64>,
    pub frequency: FrequencyMap,
    pub texture: Vec<f64>,
}

/// Central crop with `margin` of each dimension trimmed from every side.
///
/// Falls back to the whole image when the crop would be empty.
pub fn core_region(img: &GrayImage, margin: f64) -> GrayImage {
    let (width, height) = img.dimensions();
    let mx = (width as f64 * margin).round() as usize;
    let my = (height as f64 * margin).round() as usize;
    if 2 * mx >= width || 2 * my >= height {
        return img.clone();
    }
    img.crop(mx, my, width - mx, height - my)
}

#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    bank: GaborBank,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        config.validate();
        let bank = GaborBank::new(&config.gabor);
        Self { config, bank }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Length of the Gabor energy vector.
    pub fn gabor_len(&self) -> usize {
        self.bank.len() * 3
    }

    /// Length of the texture vector.
    pub fn texture_len(&self) -> usize {
        self.config.texture_grid * self.config.texture_grid * 4
    }

    /// Crop the core region of `ridges` and compute every feature family on it.
    pub fn extract(&self, ridges: &GrayImage) -> FeatureSet {
        let core = core_region(ridges, self.config.core_margin);
        let pixels = to_f32(&core);
        let gradients = sobel(&pixels);

        let orientation = OrientationField::from_gradients(&gradients, self.config.orientation_block);
        let gabor = gabor_energy(&pixels, &self.bank, self.config.gabor_percentile);
        let frequency = FrequencyMap::estimate(
            &pixels,
            &gradients,
            self.config.frequency_block,
            self.config.peak_min_distance,
            self.config.peak_min_height,
        );
        let texture = texture_stats(&pixels, &gradients, self.config.texture_grid);

        tracing::debug!(
            "Extracted features from {}x{} core: {} orientation blocks, {}/{} frequency blocks set",
            core.width(),
            core.height(),
            orientation.blocks.len(),
            frequency.set_count(),
            frequency.frequencies.len()
        );

        FeatureSet {
            core,
            orientation,
            gabor,
            frequency,
            texture,
        }
    }
}
