//! Configuration types for every pipeline stage.
//!
//! Each stage owns a flat config struct whose `Default` holds the tuned
//! constants. Configs are fixed when a stage is constructed; `validate()`
//! panics on values no stage can work with.

use serde::{Deserialize, Serialize};

use crate::imgproc::Hsv;

// ============================================================================
// Normalisation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Side of the square output canvas.
    pub output_size: usize,
    /// CLAHE tile grid (same count on both axes).
    pub clahe_tiles: usize,
    pub clahe_clip_limit: f64,
    /// Contact samples whose content mean exceeds this are inverted.
    pub invert_mean_threshold: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            output_size: 256,
            clahe_tiles: 8,
            clahe_clip_limit: 3.0,
            invert_mean_threshold: 127.0,
        }
    }
}

impl NormalizeConfig {
    pub fn validate(&self) {
        assert!(self.output_size > 0, "output_size must be positive");
        assert!(self.clahe_tiles > 0, "clahe_tiles must be positive");
        assert!(
            self.clahe_tiles <= self.output_size,
            "clahe_tiles ({}) cannot exceed output_size ({})",
            self.clahe_tiles,
            self.output_size
        );
        assert!(
            self.clahe_clip_limit > 0.0,
            "clahe_clip_limit must be positive, got {}",
            self.clahe_clip_limit
        );
    }
}

// ============================================================================
// Segmentation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinConfig {
    /// Inclusive HSV lower bound (hue in degrees).
    pub lower: Hsv,
    /// Inclusive HSV upper bound (hue in degrees).
    pub upper: Hsv,
    /// Ellipse kernel size for the cleanup morphology.
    pub kernel_size: usize,
    pub open_iterations: usize,
    pub close_iterations: usize,
}

impl Default for SkinConfig {
    fn default() -> Self {
        Self {
            lower: Hsv::new(0.0, 40.0, 80.0),
            upper: Hsv::new(20.0, 160.0, 255.0),
            kernel_size: 9,
            open_iterations: 2,
            close_iterations: 2,
        }
    }
}

impl SkinConfig {
    pub fn validate(&self) {
        assert!(
            self.lower.h <= self.upper.h && self.lower.s <= self.upper.s && self.lower.v <= self.upper.v,
            "HSV lower bound must not exceed upper bound"
        );
        assert!(self.kernel_size > 0, "kernel_size must be positive");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrabCutConfig {
    pub iterations: usize,
    /// Gaussian components per colour model.
    pub components: usize,
    /// Smoothness weight of the pairwise term.
    pub gamma: f64,
}

impl Default for GrabCutConfig {
    fn default() -> Self {
        Self {
            iterations: 7,
            components: 5,
            gamma: 50.0,
        }
    }
}

impl GrabCutConfig {
    pub fn validate(&self) {
        assert!(self.iterations > 0, "GrabCut needs at least one iteration");
        assert!(self.components > 0, "GrabCut needs at least one component");
        assert!(self.gamma >= 0.0, "gamma must be non-negative, got {}", self.gamma);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Frames whose longer side exceeds this are downscaled before graph cut.
    pub max_side: usize,
    /// Seed rectangle padding per side, as a fraction of the coarse bbox size.
    pub seed_padding: f64,
    /// Fallback seed rectangle as a centred fraction of the frame.
    pub fallback_fraction: f64,
    pub min_seed_side: usize,
    pub min_seed_area_fraction: f64,
    pub grabcut: GrabCutConfig,
    /// Ellipse kernel size of the closing applied after the coarse intersection.
    pub close_kernel_size: usize,
    pub min_component_fraction: f64,
    pub max_component_fraction: f64,
    /// Components must be taller than `min_aspect * width`.
    pub min_aspect: f64,
    pub median_kernel_size: usize,
    /// ROI padding per side, as a fraction of the mask bbox size.
    pub roi_padding: f64,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_side: 900,
            seed_padding: 0.20,
            fallback_fraction: 0.96,
            min_seed_side: 50,
            min_seed_area_fraction: 0.05,
            grabcut: GrabCutConfig::default(),
            close_kernel_size: 9,
            min_component_fraction: 0.01,
            max_component_fraction: 0.90,
            min_aspect: 0.8,
            median_kernel_size: 5,
            roi_padding: 0.05,
        }
    }
}

impl RefineConfig {
    pub fn validate(&self) {
        assert!(self.max_side > 0, "max_side must be positive");
        assert!(self.seed_padding >= 0.0, "seed_padding must be non-negative");
        assert!(
            self.fallback_fraction > 0.0 && self.fallback_fraction <= 1.0,
            "fallback_fraction must be in (0, 1], got {}",
            self.fallback_fraction
        );
        assert!(
            self.min_component_fraction <= self.max_component_fraction,
            "min_component_fraction must not exceed max_component_fraction"
        );
        assert!(
            self.median_kernel_size % 2 == 1,
            "median_kernel_size must be odd, got {}",
            self.median_kernel_size
        );
        assert!(self.close_kernel_size > 0, "close_kernel_size must be positive");
        assert!(self.roi_padding >= 0.0, "roi_padding must be non-negative");
        self.grabcut.validate();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    pub skin: SkinConfig,
    pub refine: RefineConfig,
}

impl SegmentationConfig {
    pub fn validate(&self) {
        self.skin.validate();
        self.refine.validate();
    }
}

// ============================================================================
// Gabor bank
// ============================================================================

/// Shape of every kernel in a Gabor bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaborConfig {
    /// Spatial frequencies in cycles per pixel.
    pub frequencies: Vec<f64>,
    /// Orientations evenly spaced over `[0, π)`.
    pub orientations: usize,
    /// Odd kernel side.
    pub kernel_size: usize,
    /// Gaussian envelope sigma in pixels.
    pub sigma: f64,
    /// Envelope aspect ratio along the ridge direction.
    pub gamma: f64,
}

impl GaborConfig {
    pub fn validate(&self) {
        assert!(!self.frequencies.is_empty(), "Gabor bank needs at least one frequency");
        assert!(
            self.frequencies.iter().all(|&f| f > 0.0 && f <= 0.5),
            "Gabor frequencies must be in (0, 0.5] cycles/px"
        );
        assert!(self.orientations > 0, "Gabor bank needs at least one orientation");
        assert!(
            self.kernel_size % 2 == 1,
            "Gabor kernel_size must be odd, got {}",
            self.kernel_size
        );
        assert!(self.sigma > 0.0, "Gabor sigma must be positive");
        assert!(self.gamma > 0.0, "Gabor gamma must be positive");
    }
}

// ============================================================================
// Ridge enhancement
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeConfig {
    pub clahe_tiles: usize,
    pub clahe_clip_limit: f64,
    /// Sigma of the blur feeding the unsharp mask.
    pub blur_sigma: f64,
    /// `amount * img - (amount - 1) * blur`.
    pub sharpen_amount: f32,
    pub gabor: GaborConfig,
    /// Odd block size of the adaptive threshold.
    pub threshold_block: usize,
    /// Subtracted from the local mean; negative values demand brighter pixels.
    pub threshold_offset: f64,
    /// Pixels trimmed off the content rectangle when it serves as presence mask.
    pub presence_erosion: usize,
    pub median_kernel_size: usize,
    pub open_kernel_size: usize,
}

impl Default for RidgeConfig {
    fn default() -> Self {
        Self {
            clahe_tiles: 8,
            clahe_clip_limit: 2.0,
            blur_sigma: 1.0,
            sharpen_amount: 1.6,
            gabor: GaborConfig {
                frequencies: vec![0.08, 0.10, 0.12, 0.15],
                orientations: 8,
                kernel_size: 15,
                sigma: 3.5,
                gamma: 0.5,
            },
            threshold_block: 15,
            threshold_offset: -2.0,
            presence_erosion: 4,
            median_kernel_size: 3,
            open_kernel_size: 3,
        }
    }
}

impl RidgeConfig {
    pub fn validate(&self) {
        assert!(self.clahe_tiles > 0, "clahe_tiles must be positive");
        assert!(self.blur_sigma > 0.0, "blur_sigma must be positive");
        assert!(self.sharpen_amount >= 1.0, "sharpen_amount must be >= 1");
        assert!(
            self.threshold_block % 2 == 1 && self.threshold_block > 1,
            "threshold_block must be odd and > 1, got {}",
            self.threshold_block
        );
        assert!(
            self.median_kernel_size % 2 == 1,
            "median_kernel_size must be odd, got {}",
            self.median_kernel_size
        );
        assert!(self.open_kernel_size > 0, "open_kernel_size must be positive");
        self.gabor.validate();
    }
}

// ============================================================================
// Alignment
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignConfig {
    pub min_angle_deg: f64,
    pub max_angle_deg: f64,
    pub angle_step_deg: f64,
    /// Apply a Hann window before the FFT to suppress edge effects.
    pub use_windowing: bool,
    /// Refine the correlation peak with a parabolic fit.
    pub subpixel: bool,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            min_angle_deg: -20.0,
            max_angle_deg: 20.0,
            angle_step_deg: 4.0,
            use_windowing: true,
            subpixel: true,
        }
    }
}

impl AlignConfig {
    pub fn validate(&self) {
        assert!(
            self.min_angle_deg <= self.max_angle_deg,
            "min_angle_deg must not exceed max_angle_deg"
        );
        assert!(
            self.angle_step_deg > 0.0,
            "angle_step_deg must be positive, got {}",
            self.angle_step_deg
        );
    }

    /// Every angle of the search grid, `min..=max` in `step` increments.
    pub fn angles(&self) -> Vec<f64> {
        let steps = ((self.max_angle_deg - self.min_angle_deg) / self.angle_step_deg + 1e-9).floor() as usize;
        (0..=steps)
            .map(|i| self.min_angle_deg + i as f64 * self.angle_step_deg)
            .collect()
    }
}

// ============================================================================
// Features
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Fraction trimmed off each side to form the core region.
    pub core_margin: f64,
    pub orientation_block: usize,
    pub frequency_block: usize,
    pub gabor: GaborConfig,
    /// Percentile of |response| recorded per Gabor filter.
    pub gabor_percentile: f64,
    /// Minimum spacing between profile peaks.
    pub peak_min_distance: usize,
    /// Minimum peak height as a fraction of the centred profile's std-dev.
    pub peak_min_height: f64,
    /// Texture grid cells per side.
    pub texture_grid: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            core_margin: 0.15,
            orientation_block: 16,
            frequency_block: 32,
            gabor: GaborConfig {
                frequencies: vec![0.08, 0.10, 0.12],
                orientations: 8,
                kernel_size: 15,
                sigma: 3.5,
                gamma: 0.5,
            },
            gabor_percentile: 0.9,
            peak_min_distance: 3,
            peak_min_height: 0.3,
            texture_grid: 4,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) {
        assert!(
            (0.0..0.5).contains(&self.core_margin),
            "core_margin must be in [0, 0.5), got {}",
            self.core_margin
        );
        assert!(self.orientation_block > 0, "orientation_block must be positive");
        assert!(self.frequency_block > 0, "frequency_block must be positive");
        assert!(
            (0.0..=1.0).contains(&self.gabor_percentile),
            "gabor_percentile must be in [0, 1]"
        );
        assert!(self.peak_min_distance > 0, "peak_min_distance must be positive");
        assert!(self.texture_grid > 0, "texture_grid must be positive");
        self.gabor.validate();
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Fusion weights of the five similarity families.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub orientation: f64,
    pub gabor: f64,
    pub frequency: f64,
    pub texture: f64,
    pub pixel: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            orientation: 0.30,
            gabor: 0.25,
            frequency: 0.20,
            texture: 0.15,
            pixel: 0.10,
        }
    }
}

impl FusionWeights {
    pub fn sum(&self) -> f64 {
        self.orientation + self.gabor + self.frequency + self.texture + self.pixel
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: FusionWeights,
    /// Scores at or above this are a match.
    pub match_score: f64,
    /// Scores at or above this (and below `match_score`) are uncertain.
    pub uncertain_score: f64,
    /// Orientation blocks at or below this coherence are ignored.
    pub min_coherence: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            match_score: 58.0,
            uncertain_score: 45.0,
            min_coherence: 0.2,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) {
        let w = &self.weights;
        assert!(
            [w.orientation, w.gabor, w.frequency, w.texture, w.pixel]
                .iter()
                .all(|&v| v >= 0.0),
            "fusion weights must be non-negative"
        );
        assert!(
            (w.sum() - 1.0).abs() < 1e-6,
            "fusion weights must sum to 1, got {}",
            w.sum()
        );
        assert!(
            self.uncertain_score <= self.match_score,
            "uncertain_score must not exceed match_score"
        );
        assert!(
            (0.0..1.0).contains(&self.min_coherence),
            "min_coherence must be in [0, 1)"
        );
    }
}

// ============================================================================
// Capture quality
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Laplacian variance that maps to a full sharpness score.
    pub sharpness_reference: f64,
    /// Intensity std-dev that maps to a full contrast score.
    pub contrast_reference: f64,
    /// Mask coverage that maps to a full coverage score.
    pub coverage_reference: f64,
    pub sharpness_weight: f64,
    pub contrast_weight: f64,
    pub coverage_weight: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            sharpness_reference: 500.0,
            contrast_reference: 60.0,
            coverage_reference: 0.25,
            sharpness_weight: 0.5,
            contrast_weight: 0.3,
            coverage_weight: 0.2,
        }
    }
}

impl QualityConfig {
    pub fn validate(&self) {
        assert!(
            self.sharpness_reference > 0.0
                && self.contrast_reference > 0.0
                && self.coverage_reference > 0.0,
            "quality references must be positive"
        );
        let total = self.sharpness_weight + self.contrast_weight + self.coverage_weight;
        assert!(
            (total - 1.0).abs() < 1e-6,
            "quality weights must sum to 1, got {}",
            total
        );
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Consecutive qualifying frames needed before the gate fires.
    pub required_frames: usize,
    pub min_score: f64,
    /// Largest ROI centre movement between frames, in pixels.
    pub max_drift_px: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            required_frames: 5,
            min_score: 60.0,
            max_drift_px: 12.0,
        }
    }
}

impl StabilityConfig {
    pub fn validate(&self) {
        assert!(self.required_frames > 0, "required_frames must be positive");
        assert!(self.max_drift_px >= 0.0, "max_drift_px must be non-negative");
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// Everything the hybrid matcher needs, one section per stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    pub normalize: NormalizeConfig,
    pub ridge: RidgeConfig,
    pub align: AlignConfig,
    pub features: FeatureConfig,
    pub scoring: ScoringConfig,
}

impl MatcherConfig {
    pub fn validate(&self) {
        self.normalize.validate();
        self.ridge.validate();
        self.align.validate();
        self.features.validate();
        self.scoring.validate();
    }
}
