//! Graph-cut refinement of the coarse skin mask.

use serde::{Deserialize, Serialize};

use super::grabcut::grab_cut;
use crate::config::RefineConfig;
use crate::image::{ColorImage, Mask, Roi};
use crate::imgproc::{
    StructuringElement, close, label_components, median_blur_mask, resize_bilinear,
    resize_nearest_mask,
};

/// Which path produced a refined mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefineMethod {
    GraphCut,
    /// Graph cut failed; the coarse mask was used as is.
    CoarseMask,
    /// Graph cut failed and the coarse mask was empty.
    FullFrame,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefinedRegion {
    /// Final mask at source resolution.
    pub mask: Mask,
    /// Padded bounding box of `mask`. For a 0×0 image this is the 1×1
    /// [`Roi::full`] sentinel, which lies outside the frame; callers cropping
    /// with it must check for an empty image first.
    pub roi: Roi,
    pub method: RefineMethod,
}

#[derive(Debug, Clone)]
pub struct RegionRefiner {
    config: RefineConfig,
    close_kernel: StructuringElement,
}

impl Default for RegionRefiner {
    fn default() -> Self {
        Self::new(RefineConfig::default())
    }
}

impl RegionRefiner {
    pub fn new(config: RefineConfig) -> Self {
        config.validate();
        let close_kernel =
            StructuringElement::ellipse(config.close_kernel_size, config.close_kernel_size);
        Self {
            config,
            close_kernel,
        }
    }

    /// Refine `coarse` over `image`. Never fails; see [`RefineMethod`] for the fallbacks.
    pub fn refine(&self, image: &ColorImage, coarse: &Mask) -> RefinedRegion {
        let (width, height) = image.dimensions();
        assert_eq!(
            coarse.dimensions(),
            (width, height),
            "coarse mask must match image dimensions"
        );
        if image.is_empty() {
            return RefinedRegion {
                mask: coarse.clone(),
                roi: Roi::full(width, height),
                method: RefineMethod::FullFrame,
            };
        }

        let longest = width.max(height);
        let scale = if longest > self.config.max_side {
            self.config.max_side as f64 / longest as f64
        } else {
            1.0
        };
        let (work_w, work_h) = if scale < 1.0 {
            (
                ((width as f64 * scale).round() as usize).max(1),
                ((height as f64 * scale).round() as usize).max(1),
            )
        } else {
            (width, height)
        };
        let (work_image, work_coarse) = if scale < 1.0 {
            tracing::debug!("Downscaling {}x{} to {}x{} for refinement", width, height, work_w, work_h);
            (
                resize_bilinear(image, work_w, work_h),
                resize_nearest_mask(coarse, work_w, work_h),
            )
        } else {
            (image.clone(), coarse.clone())
        };

        let rect = self.seed_rect(&work_coarse);
        let (cut, method) = match grab_cut(&work_image, rect, &self.config.grabcut) {
            Ok(mask) => (mask, RefineMethod::GraphCut),
            Err(err) => {
                tracing::warn!("Graph cut failed ({}), falling back to coarse mask", err);
                if coarse.is_all_clear() {
                    let full = Mask::new_filled(width, height, true);
                    return RefinedRegion {
                        mask: full,
                        roi: Roi::full(width, height),
                        method: RefineMethod::FullFrame,
                    };
                }
                return RefinedRegion {
                    roi: self.padded_roi(coarse),
                    mask: coarse.clone(),
                    method: RefineMethod::CoarseMask,
                };
            }
        };

        let upscaled = if scale < 1.0 {
            resize_nearest_mask(&cut, width, height)
        } else {
            cut
        };
        let joined = close(&upscaled.and(coarse), &self.close_kernel, 1);
        let filtered = self.filter_components(&joined);
        let mask = median_blur_mask(&filtered, self.config.median_kernel_size);
        let roi = self.padded_roi(&mask);

        tracing::debug!(
            "Refined mask: {} px, roi {}x{} at ({}, {})",
            mask.count_ones(),
            roi.width(),
            roi.height(),
            roi.left(),
            roi.top()
        );
        RefinedRegion { mask, roi, method }
    }

    /// Padded coarse bbox, or a centred fallback rectangle, or the full frame.
    pub fn seed_rect(&self, coarse: &Mask) -> Roi {
        let (width, height) = coarse.dimensions();
        let padded = coarse.bounding_box().map(|(x0, y0, x1, y1)| {
            let (bw, bh) = ((x1 - x0 + 1) as f64, (y1 - y0 + 1) as f64);
            let pad_x = bw * self.config.seed_padding;
            let pad_y = bh * self.config.seed_padding;
            Roi::clamped(
                x0 as f64 - pad_x,
                y0 as f64 - pad_y,
                (x1 + 1) as f64 + pad_x,
                (y1 + 1) as f64 + pad_y,
                width,
                height,
            )
        });
        if let Some(rect) = padded.filter(|r| self.seed_acceptable(r, width, height)) {
            return rect;
        }

        let f = self.config.fallback_fraction;
        let margin_x = width as f64 * (1.0 - f) / 2.0;
        let margin_y = height as f64 * (1.0 - f) / 2.0;
        let centred = Roi::clamped(
            margin_x,
            margin_y,
            width as f64 - margin_x,
            height as f64 - margin_y,
            width,
            height,
        );
        if self.seed_acceptable(&centred, width, height) {
            centred
        } else {
            Roi::full(width, height)
        }
    }

    fn seed_acceptable(&self, rect: &Roi, width: usize, height: usize) -> bool {
        let min_side = self.config.min_seed_side;
        let min_area = self.config.min_seed_area_fraction * (width * height) as f64;
        rect.width() >= min_side && rect.height() >= min_side && rect.area() as f64 >= min_area
    }

    /// Keep finger-shaped components, or the largest one when none qualifies.
    ///
    /// A component qualifies when its area lies within the configured
    /// fraction band of the frame and its bbox is taller than
    /// `min_aspect * width`.
    pub fn filter_components(&self, mask: &Mask) -> Mask {
        let components = label_components(mask);
        let frame_area = mask.len() as f64;
        let min_area = self.config.min_component_fraction * frame_area;
        let max_area = self.config.max_component_fraction * frame_area;
        let min_aspect = self.config.min_aspect;

        let qualifies = |s: &crate::imgproc::ComponentStats| {
            let area = s.area as f64;
            area >= min_area
                && area <= max_area
                && s.height() as f64 / s.width() as f64 > min_aspect
        };

        if components.stats.iter().any(qualifies) {
            return components.select(qualifies);
        }
        match components.largest() {
            Some(largest) => {
                let label = largest.label;
                components.select(|s| s.label == label)
            }
            None => mask.clone(),
        }
    }

    /// Mask bbox padded per side, clamped; the full frame for an empty mask.
    pub fn padded_roi(&self, mask: &Mask) -> Roi {
        let (width, height) = mask.dimensions();
        match mask.bounding_box() {
            Some((x0, y0, x1, y1)) => {
                let pad_x = (x1 - x0 + 1) as f64 * self.config.roi_padding;
                let pad_y = (y1 - y0 + 1) as f64 * self.config.roi_padding;
                Roi::clamped(
                    x0 as f64 - pad_x,
                    y0 as f64 - pad_y,
                    (x1 + 1) as f64 + pad_x,
                    (y1 + 1) as f64 + pad_y,
                    width,
                    height,
                )
            }
            None => Roi::full(width, height),
        }
    }
}
