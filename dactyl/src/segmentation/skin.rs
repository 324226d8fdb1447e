use crate::config::SkinConfig;
use crate::image::{ColorImage, Mask};
use crate::imgproc::{StructuringElement, close, hsv_in_range, open};

/// Coarse skin detector: HSV in-range test followed by morphological cleanup.
///
/// The mask favours recall; it only seeds the graph-cut refiner.
#[derive(Debug, Clone)]
pub struct SkinSegmenter {
    config: SkinConfig,
    kernel: StructuringElement,
}

impl Default for SkinSegmenter {
    fn default() -> Self {
        Self::new(SkinConfig::default())
    }
}

impl SkinSegmenter {
    pub fn new(config: SkinConfig) -> Self {
        config.validate();
        let kernel = StructuringElement::ellipse(config.kernel_size, config.kernel_size);
        Self { config, kernel }
    }

    pub fn segment(&self, image: &ColorImage) -> Mask {
        let raw = hsv_in_range(image, self.config.lower, self.config.upper);
        let opened = open(&raw, &self.kernel, self.config.open_iterations);
        let mask = close(&opened, &self.kernel, self.config.close_iterations);
        tracing::debug!(
            "Skin mask: {} raw -> {} cleaned pixels of {}",
            raw.count_ones(),
            mask.count_ones(),
            mask.len()
        );
        mask
    }
}
