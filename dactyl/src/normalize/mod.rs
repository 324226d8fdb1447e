//! Square, contrast-equalised grayscale canvases for matching.


use common::Buffer2;

use crate::config::NormalizeConfig;
use crate::image::{GrayImage, Image, Roi};
use crate::imgproc::{clahe, region_mean, resize_bilinear};

/// Normaliser output: the canvas and where the source content sits on it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pub image: GrayImage,
    /// Letterboxed content rectangle. The full canvas for an empty source.
    pub content: Roi,
}

/// Placement of a `width × height` source scaled uniformly into a square canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f64,
    pub content: Roi,
}

/// Uniform scale `min(S / w, S / h)` and the centred content rectangle.
///
/// The scaled size is rounded and kept at least one pixel on each axis.
/// Returns `None` for an empty source.
pub fn letterbox(width: usize, height: usize, size: usize) -> Option<Letterbox> {
    if width == 0 || height == 0 || size == 0 {
        return None;
    }
    let scale = (size as f64 / width as f64).min(size as f64 / height as f64);
    let new_w = ((width as f64 * scale).round() as usize).clamp(1, size);
    let new_h = ((height as f64 * scale).round() as usize).clamp(1, size);
    let left = (size - new_w) / 2;
    let top = (size - new_h) / 2;
    let content = Roi::new_checked(left, top, left + new_w, top + new_h, size, size)?;
    Some(Letterbox { scale, content })
}

/// Turns captures and stored samples into `S × S` grayscale canvases.
#[derive(Debug, Clone, Default)]
pub struct ImageNormalizer {
    config: NormalizeConfig,
}

impl ImageNormalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        config.validate();
        Self { config }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Gray conversion, aspect-preserving letterbox, optional polarity fix and CLAHE.
    ///
    /// Contact samples (ink or scanner prints) carry dark ridges on a bright
    /// background; when their content mean exceeds the configured threshold
    /// the content region is inverted so both capture kinds share polarity.
    /// Never fails: an empty source yields a black canvas.
    pub fn normalize(&self, image: &Image, is_contact_sample: bool) -> NormalizedImage {
        let size = self.config.output_size;
        let Some(placement) = letterbox(image.width(), image.height(), size) else {
            tracing::debug!("Empty source image, returning black {}x{} canvas", size, size);
            return NormalizedImage {
                image: Buffer2::new_default(size, size),
                content: Roi::full(size, size),
            };
        };
        let content = placement.content;

        let gray = image.to_gray();
        let resized = resize_bilinear(&gray, content.width(), content.height());

        let mut canvas: GrayImage = Buffer2::new_default(size, size);
        for y in 0..content.height() {
            canvas.row_mut(content.top() + y)[content.left()..content.right()]
                .copy_from_slice(resized.row(y));
        }

        if is_contact_sample {
            let mean = region_mean(
                &canvas,
                content.left(),
                content.top(),
                content.right(),
                content.bottom(),
            );
            if mean > self.config.invert_mean_threshold {
                tracing::debug!("Inverting contact sample (content mean {:.1})", mean);
                for y in content.top()..content.bottom() {
                    for v in &mut canvas.row_mut(y)[content.left()..content.right()] {
                        *v = 255 - *v;
                    }
                }
            }
        }

        let tiles = self.config.clahe_tiles;
        NormalizedImage {
            image: clahe(&canvas, tiles, tiles, self.config.clahe_clip_limit),
            content,
        }
    }
}
