use std::fmt;

use serde::{Deserialize, Serialize};

use super::similarity::{
    frequency_similarity, orientation_similarity, pixel_similarity, vector_similarity,
};
use crate::config::ScoringConfig;
use crate::features::FeatureSet;

/// Three-way verdict on a fused score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Match,
    Uncertain,
    NoMatch,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Match => write!(f, "MATCH"),
            Decision::Uncertain => write!(f, "UNCERTAIN"),
            Decision::NoMatch => write!(f, "NO_MATCH"),
        }
    }
}

/// Similarity of each feature family, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureScores {
    pub orientation: f64,
    pub gabor: f64,
    pub frequency: f64,
    pub texture: f64,
    pub pixel: f64,
}

/// Compares feature sets and turns the comparison into a score and decision.
#[derive(Debug, Clone, Default)]
pub struct MatchScorer {
    config: ScoringConfig,
}

impl MatchScorer {
    pub fn new(config: ScoringConfig) -> Self {
        config.validate();
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn similarities(&self, probe: &FeatureSet, candidate: &FeatureSet) -> FeatureScores {
        FeatureScores {
            orientation: orientation_similarity(
                &probe.orientation,
                &candidate.orientation,
                self.config.min_coherence,
            ),
            gabor: vector_similarity(&probe.gabor, &candidate.gabor),
            frequency: frequency_similarity(&probe.frequency, &candidate.frequency),
            texture: vector_similarity(&probe.texture, &candidate.texture),
            pixel: pixel_similarity(&probe.core, &candidate.core),
        }
    }

    /// Weighted sum of the similarities scaled to `[0, 100]`.
    pub fn fuse(&self, scores: &FeatureScores) -> f64 {
        let w = &self.config.weights;
        let fused = w.orientation * scores.orientation
            + w.gabor * scores.gabor
            + w.frequency * scores.frequency
            + w.texture * scores.texture
            + w.pixel * scores.pixel;
        if fused.is_nan() {
            return 0.0;
        }
        (fused * 100.0).clamp(0.0, 100.0)
    }

    /// Bands are inclusive at their lower bound.
    pub fn decide(&self, score: f64) -> Decision {
        if score >= self.config.match_score {
            Decision::Match
        } else if score >= self.config.uncertain_score {
            Decision::Uncertain
        } else {
            Decision::NoMatch
        }
    }

    /// Similarities, fused score and decision for one pair.
    pub fn score(&self, probe: &FeatureSet, candidate: &FeatureSet) -> (FeatureScores, f64, Decision) {
        let scores = self.similarities(probe, candidate);
        let fused = self.fuse(&scores);
        (scores, fused, self.decide(fused))
    }
}
