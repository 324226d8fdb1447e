//! Capture-time finger segmentation.
//!
//! A permissive HSV skin mask seeds a graph-cut refinement; the refined mask
//! and its padded bounding box drive the capture overlay and the crop handed
//! to quality assessment.

mod grabcut;
mod refine;
mod skin;


pub use grabcut::{GrabCutError, grab_cut};
pub use refine::{RefineMethod, RefinedRegion, RegionRefiner};
pub use skin::SkinSegmenter;

use common::Buffer2;

use crate::config::SegmentationConfig;
use crate::image::{ColorImage, Mask, Roi};
use crate::imgproc::apply_mask;

/// Everything the capture screen overlays for one frame.
#[derive(Debug, Clone)]
pub struct CaptureSegmentation {
    /// Raw skin mask before refinement.
    pub coarse: Mask,
    pub refined: RefinedRegion,
    /// Source image with the background zeroed.
    pub segmented: ColorImage,
    /// Source pixels inside the ROI.
    pub crop: ColorImage,
}

impl CaptureSegmentation {
    #[inline]
    pub fn mask(&self) -> &Mask {
        &self.refined.mask
    }

    #[inline]
    pub fn roi(&self) -> Roi {
        self.refined.roi
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaptureSegmenter {
    skin: SkinSegmenter,
    refiner: RegionRefiner,
}

impl CaptureSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self {
            skin: SkinSegmenter::new(config.skin),
            refiner: RegionRefiner::new(config.refine),
        }
    }

    pub fn segment_capture(&self, image: &ColorImage) -> CaptureSegmentation {
        let coarse = self.skin.segment(image);
        let refined = self.refiner.refine(image, &coarse);
        let segmented = apply_mask(image, &refined.mask);

        let roi = refined.roi;
        let crop = if image.is_empty() {
            Buffer2::new_default(0, 0)
        } else {
            image.crop(roi.left(), roi.top(), roi.right(), roi.bottom())
        };

        tracing::info!(
            "Segmented capture {}x{}: method {:?}, roi {}x{}",
            image.width(),
            image.height(),
            refined.method,
            roi.width(),
            roi.height()
        );

        CaptureSegmentation {
            coarse,
            refined,
            segmented,
            crop,
        }
    }
}
