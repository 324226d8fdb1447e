//! Binary ridge extraction with a Gabor filter bank.
//!
//! The enhanced image is filtered by every kernel of the bank and the
//! strongest absolute response per pixel becomes a ridge-energy map, which is
//! stretched to 8 bits, binarised against its Gaussian local mean and cleaned
//! up morphologically.


use common::Buffer2;

use crate::config::RidgeConfig;
use crate::gabor::GaborBank;
use crate::image::{GrayImage, Mask, Roi, mask_to_gray};
use crate::imgproc::{
    StructuringElement, adaptive_threshold_gaussian, apply_mask, binary_to_mask, clahe,
    gaussian_blur_f32, median_blur, normalize_min_max, open, to_f32, unsharp,
};

/// Peak ridge energy below which an image is treated as featureless.
const MIN_RIDGE_ENERGY: f32 = 1.0;

/// Rectangle `content` shrunk by `erosion` pixels per side, as a mask of a
/// `width × height` frame. A rectangle too small to shrink is kept whole.
pub fn presence_from_content(content: Roi, width: usize, height: usize, erosion: usize) -> Mask {
    let (left, top, right, bottom) =
        if content.width() > 2 * erosion && content.height() > 2 * erosion {
            (
                content.left() + erosion,
                content.top() + erosion,
                content.right() - erosion,
                content.bottom() - erosion,
            )
        } else {
            (content.left(), content.top(), content.right(), content.bottom())
        };
    Mask::from_fn(width, height, |x, y| {
        x >= left && x < right && y >= top && y < bottom
    })
}

#[derive(Debug, Clone)]
pub struct RidgeEnhancer {
    config: RidgeConfig,
    bank: GaborBank,
    open_kernel: StructuringElement,
}

impl Default for RidgeEnhancer {
    fn default() -> Self {
        Self::new(RidgeConfig::default())
    }
}

impl RidgeEnhancer {
    pub fn new(config: RidgeConfig) -> Self {
        config.validate();
        let bank = GaborBank::new(&config.gabor);
        let open_kernel = StructuringElement::ellipse(config.open_kernel_size, config.open_kernel_size);
        Self {
            config,
            bank,
            open_kernel,
        }
    }

    pub fn config(&self) -> &RidgeConfig {
        &self.config
    }

    /// 0/255 ridge image of a normalised canvas.
    ///
    /// Pixels outside `presence` are cleared before cleanup. A presence mask
    /// whose size differs from the image is ignored.
    pub fn extract_ridges(&self, normalized: &GrayImage, presence: Option<&Mask>) -> GrayImage {
        if normalized.is_empty() {
            return normalized.clone();
        }
        let c = &self.config;

        let equalized = clahe(normalized, c.clahe_tiles, c.clahe_tiles, c.clahe_clip_limit);
        let pixels = to_f32(&equalized);
        let blurred = gaussian_blur_f32(&pixels, 0, c.blur_sigma);
        let sharpened = unsharp(&pixels, &blurred, c.sharpen_amount);

        let energy = self.bank.max_abs_response(&sharpened);
        let peak = energy.iter().copied().fold(0.0f32, f32::max);
        if peak < MIN_RIDGE_ENERGY {
            tracing::debug!("No ridge energy (peak {:.3}), returning empty ridge image", peak);
            return Buffer2::new_default(normalized.width(), normalized.height());
        }
        let energy = normalize_min_max(&energy);
        let mut binary = adaptive_threshold_gaussian(&energy, c.threshold_block, c.threshold_offset);

        if let Some(presence) = presence {
            if presence.dimensions() == binary.dimensions() {
                binary = apply_mask(&binary, presence);
            } else {
                tracing::warn!(
                    "Presence mask {}x{} does not match ridge image {}x{}, ignoring it",
                    presence.width(),
                    presence.height(),
                    binary.width(),
                    binary.height()
                );
            }
        }

        let smoothed = median_blur(&binary, c.median_kernel_size);
        let cleaned = open(&binary_to_mask(&smoothed), &self.open_kernel, 1);
        mask_to_gray(&cleaned)
    }
}
