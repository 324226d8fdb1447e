//! Dactyl - finger capture segmentation and fingerprint matching.
//!
//! - Skin segmentation with graph-cut refinement for capture-time ROI
//! - Gabor filter bank ridge extraction
//! - Rotation search plus phase-correlation alignment
//! - Orientation, Gabor energy, ridge frequency and texture features fused
//!   into a 0-100 score with a three-way decision
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dactyl::{Candidate, CancelToken, HybridMatcher, Image, Matcher};
//!
//! let matcher = HybridMatcher::default();
//! let candidates = vec![Candidate::new("left-index", candidate_image)];
//! let result = matcher.match_candidates(&probe_image, &candidates, 0.6, &CancelToken::new())?;
//!
//! for c in &result.candidates {
//!     println!("{}: {:.1} {}", c.candidate_id, c.score, c.decision);
//! }
//! ```

pub mod align;
pub mod config;
pub mod features;
pub mod gabor;
pub mod image;
pub mod imgproc;
pub mod matching;
pub mod normalize;
pub mod quality;
pub mod report;
pub mod ridge;
pub mod segmentation;

#[cfg(test)]
pub(crate) mod testing;

pub use common::CancelToken;

// ============================================================================
// Images
// ============================================================================

pub use crate::image::{ColorImage, GrayImage, Image, ImageError, Mask, PixelFormat, Roi};

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    AlignConfig, FeatureConfig, FusionWeights, GaborConfig, GrabCutConfig, MatcherConfig,
    NormalizeConfig, QualityConfig, RefineConfig, RidgeConfig, ScoringConfig, SegmentationConfig,
    SkinConfig, StabilityConfig,
};

// ============================================================================
// Pipeline stages
// ============================================================================

pub use align::{AlignedImage, Aligner, Alignment};
pub use features::{FeatureExtractor, FeatureSet, FrequencyMap, OrientationField};
pub use normalize::{ImageNormalizer, NormalizedImage};
pub use ridge::RidgeEnhancer;
pub use segmentation::{
    CaptureSegmentation, CaptureSegmenter, RefineMethod, RefinedRegion, RegionRefiner,
    SkinSegmenter,
};

// ============================================================================
// Matching
// ============================================================================

pub use matching::{
    Candidate, CandidateMatch, Decision, FeatureScores, HybridMatcher, MatchError, MatchResult,
    MatchScorer, Matcher,
};
pub use quality::{CaptureQuality, StabilityGate, assess_quality};
pub use report::{CandidateReport, MatchReport};
