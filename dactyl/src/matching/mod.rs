//! Hybrid multi-feature matching of a probe against candidate images.
//!
//! Every candidate runs normalize → ridges → align to the probe ridges →
//! features → fused score independently; candidates fan out on the rayon
//! pool and are joined, then sorted by descending score.

mod scorer;
mod similarity;

#[cfg(test)]
mod tests;

use std::time::{Duration, Instant};

use common::parallel::par_map_cancellable;
use common::CancelToken;
use serde::Serialize;

pub use scorer::{Decision, FeatureScores, MatchScorer};
pub use similarity::{
    NEUTRAL, frequency_similarity, orientation_similarity, pixel_similarity, vector_similarity,
};

use crate::align::{Aligner, Alignment};
use crate::config::MatcherConfig;
use crate::features::{FeatureExtractor, FeatureSet};
use crate::image::{GrayImage, Image};
use crate::normalize::ImageNormalizer;
use crate::ridge::{RidgeEnhancer, presence_from_content};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("matching cancelled after {completed} of {total} candidates")]
    Cancelled { completed: usize, total: usize },
}

/// A named image to compare the probe against.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub image: Image,
}

impl Candidate {
    pub fn new(id: impl Into<String>, image: impl Into<Image>) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
        }
    }
}

/// Outcome for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateMatch {
    pub candidate_id: String,
    /// Fused score in `[0, 100]`.
    pub score: f64,
    pub decision: Decision,
    pub feature_scores: FeatureScores,
    /// Alignment of the candidate onto the probe, when both had ridges.
    pub alignment: Option<Alignment>,
    pub elapsed: Duration,
}

impl CandidateMatch {
    /// Fail-safe result for a candidate that could not be compared.
    fn unavailable(candidate_id: &str, elapsed: Duration) -> Self {
        Self {
            candidate_id: candidate_id.to_string(),
            score: 0.0,
            decision: Decision::NoMatch,
            feature_scores: FeatureScores::default(),
            alignment: None,
            elapsed,
        }
    }
}

/// Result of one match run; candidates are ordered by descending score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Caller-supplied threshold, echoed for reporting only.
    pub threshold_used: f64,
    pub candidates: Vec<CandidateMatch>,
    pub elapsed: Duration,
}

impl MatchResult {
    pub fn best(&self) -> Option<&CandidateMatch> {
        self.candidates.first()
    }
}

/// A matching strategy, chosen when the engine is built.
pub trait Matcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score every candidate against `probe`.
    ///
    /// `threshold` is informational and echoed in the result. Cancellation is
    /// checked before each candidate starts.
    fn match_candidates(
        &self,
        probe: &Image,
        candidates: &[Candidate],
        threshold: f64,
        cancel: &CancelToken,
    ) -> Result<MatchResult, MatchError>;
}

/// Probe ridges and features, computed once per run and shared read-only.
#[derive(Debug, Clone)]
pub struct PreparedProbe {
    pub ridges: GrayImage,
    pub features: FeatureSet,
}

/// Orientation, Gabor energy, frequency, texture and pixel similarity fused
/// into one score.
pub struct HybridMatcher {
    normalizer: ImageNormalizer,
    enhancer: RidgeEnhancer,
    aligner: Aligner,
    extractor: FeatureExtractor,
    scorer: MatchScorer,
    presence_erosion: usize,
}

impl Default for HybridMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}

impl HybridMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        config.validate();
        Self {
            presence_erosion: config.ridge.presence_erosion,
            normalizer: ImageNormalizer::new(config.normalize),
            enhancer: RidgeEnhancer::new(config.ridge),
            aligner: Aligner::new(config.align),
            extractor: FeatureExtractor::new(config.features),
            scorer: MatchScorer::new(config.scoring),
        }
    }

    pub fn scorer(&self) -> &MatchScorer {
        &self.scorer
    }

    /// Normalized binary ridge image, or `None` when the image is empty or
    /// has no ridge pixels.
    pub fn ridges(&self, image: &Image, is_contact_sample: bool) -> Option<GrayImage> {
        if image.is_empty() {
            return None;
        }
        let normalized = self.normalizer.normalize(image, is_contact_sample);
        let (width, height) = normalized.image.dimensions();
        let presence = presence_from_content(normalized.content, width, height, self.presence_erosion);
        let ridges = self.enhancer.extract_ridges(&normalized.image, Some(&presence));
        if ridges.iter().all(|&v| v == 0) {
            return None;
        }
        Some(ridges)
    }

    /// Ridges and features of the probe, taken as a non-contact capture.
    pub fn prepare_probe(&self, probe: &Image) -> Option<PreparedProbe> {
        let ridges = self.ridges(probe, false)?;
        let features = self.extractor.extract(&ridges);
        Some(PreparedProbe { ridges, features })
    }

    /// Compare one candidate, taken as a contact sample, with a prepared probe.
    pub fn score_candidate(&self, probe: &PreparedProbe, candidate: &Candidate) -> CandidateMatch {
        let start = Instant::now();
        let Some(ridges) = self.ridges(&candidate.image, true) else {
            tracing::warn!("Candidate {} has no usable ridges, scoring as no match", candidate.id);
            return CandidateMatch::unavailable(&candidate.id, start.elapsed());
        };

        let aligned = self.aligner.align(&probe.ridges, &ridges);
        let features = self.extractor.extract(&aligned.image);
        let (feature_scores, score, decision) = self.scorer.score(&probe.features, &features);

        tracing::debug!(
            "Candidate {}: score {:.1} ({}), rotation {:.0} deg",
            candidate.id,
            score,
            decision,
            aligned.alignment.rotation_degrees
        );

        CandidateMatch {
            candidate_id: candidate.id.clone(),
            score,
            decision,
            feature_scores,
            alignment: Some(aligned.alignment),
            elapsed: start.elapsed(),
        }
    }
}

impl Matcher for HybridMatcher {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn match_candidates(
        &self,
        probe: &Image,
        candidates: &[Candidate],
        threshold: f64,
        cancel: &CancelToken,
    ) -> Result<MatchResult, MatchError> {
        let start = Instant::now();
        tracing::info!("Matching probe against {} candidates", candidates.len());

        let prepared = self.prepare_probe(probe);
        if prepared.is_none() {
            tracing::warn!("Probe has no usable ridges, every candidate scores as no match");
        }

        let mut results = par_map_cancellable(candidates, cancel, |candidate| match &prepared {
            Some(probe) => self.score_candidate(probe, candidate),
            None => CandidateMatch::unavailable(&candidate.id, Duration::ZERO),
        })
        .map_err(|c| MatchError::Cancelled {
            completed: c.completed,
            total: candidates.len(),
        })?;

        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        let elapsed = start.elapsed();
        tracing::info!(
            "Matched {} candidates in {:.1} ms",
            results.len(),
            elapsed.as_secs_f64() * 1000.0
        );

        Ok(MatchResult {
            threshold_used: threshold,
            candidates: results,
            elapsed,
        })
    }
}
