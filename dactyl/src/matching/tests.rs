use std::f64::consts::{FRAC_PI_2, PI};

use common::{Buffer2, CancelToken};
use glam::DVec2;

use super::*;
use crate::align::Aligner;
use crate::config::ScoringConfig;
use crate::features::{FrequencyMap, OrientationBlock, OrientationField};
use crate::testing::{init_tracing, ridge_pattern, rotate_translate};

fn field(blocks: Vec<(f64, f64)>, width: usize) -> OrientationField {
    let height = blocks.len() / width;
    let blocks = blocks
        .into_iter()
        .map(|(angle, coherence)| OrientationBlock { angle, coherence })
        .collect();
    OrientationField {
        block_size: 16,
        blocks: Buffer2::new(width, height, blocks),
    }
}

fn frequency_map(values: Vec<f64>, width: usize) -> FrequencyMap {
    let height = values.len() / width;
    FrequencyMap {
        block_size: 32,
        frequencies: Buffer2::new(width, height, values),
    }
}

// ============================================================================
// Similarities
// ============================================================================

#[test]
fn test_vector_similarity() {
    let v = [1.0, 2.0, 3.0];
    assert!((vector_similarity(&v, &v) - 1.0).abs() < 1e-12);
    assert_eq!(vector_similarity(&v, &[0.0, 0.0, 0.0]), NEUTRAL);
    assert_eq!(vector_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    assert_eq!(vector_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
    assert_eq!(vector_similarity(&v, &[1.0, 2.0]), NEUTRAL);
}

#[test]
fn test_orientation_similarity_self_is_one() {
    let a = field(vec![(0.1, 0.9), (1.2, 0.5), (2.9, 0.7), (0.4, 0.3)], 2);
    assert!((orientation_similarity(&a, &a, 0.2) - 1.0).abs() < 1e-12);
}

#[test]
fn test_orientation_similarity_perpendicular_is_zero() {
    let a = field(vec![(0.0, 0.9), (0.3, 0.9)], 2);
    let b = field(vec![(FRAC_PI_2, 0.9), (0.3 + FRAC_PI_2, 0.9)], 2);
    assert!(orientation_similarity(&a, &b, 0.2).abs() < 1e-12);
}

#[test]
fn test_orientation_similarity_wraps_at_pi() {
    let a = field(vec![(0.05, 0.9)], 1);
    let b = field(vec![(PI - 0.05, 0.9)], 1);
    let expected = 1.0 - 0.1 / FRAC_PI_2;
    assert!((orientation_similarity(&a, &b, 0.2) - expected).abs() < 1e-9);
}

#[test]
fn test_orientation_similarity_ignores_incoherent_blocks() {
    let a = field(vec![(0.0, 0.9), (0.0, 0.2)], 2);
    let b = field(vec![(0.0, 0.9), (FRAC_PI_2, 0.9)], 2);
    assert!((orientation_similarity(&a, &b, 0.2) - 1.0).abs() < 1e-12);

    let weak = field(vec![(0.0, 0.1), (1.0, 0.2)], 2);
    assert_eq!(orientation_similarity(&weak, &b, 0.2), NEUTRAL);
}

#[test]
fn test_frequency_similarity() {
    let a = frequency_map(vec![0.08, 0.10, 0.12, 0.0], 2);
    assert!((frequency_similarity(&a, &a) - 1.0).abs() < 1e-9);

    let scaled = frequency_map(vec![0.16, 0.20, 0.24, 0.11], 2);
    assert!((frequency_similarity(&a, &scaled) - 1.0).abs() < 1e-9);

    let reversed = frequency_map(vec![0.12, 0.10, 0.08, 0.0], 2);
    assert!(frequency_similarity(&a, &reversed).abs() < 1e-9);
}

#[test]
fn test_frequency_similarity_degenerate_is_neutral() {
    let a = frequency_map(vec![0.1, 0.0, 0.0, 0.0], 2);
    assert_eq!(frequency_similarity(&a, &a), NEUTRAL);

    let flat = frequency_map(vec![0.1, 0.1, 0.1, 0.1], 2);
    assert_eq!(frequency_similarity(&flat, &flat), NEUTRAL);
}

#[test]
fn test_pixel_similarity() {
    let a = Buffer2::from_fn(16, 16, |x, y| ((x * 13 + y * 7) % 256) as u8);
    assert!((pixel_similarity(&a, &a) - 1.0).abs() < 1e-12);

    let inverted = a.map(|&v| 255 - v);
    assert_eq!(pixel_similarity(&a, &inverted), 0.0);

    let flat = Buffer2::new_filled(16, 16, 9u8);
    assert_eq!(pixel_similarity(&a, &flat), NEUTRAL);
    assert_eq!(pixel_similarity(&a, &Buffer2::new_filled(8, 8, 1u8)), NEUTRAL);
}

// ============================================================================
// Scorer
// ============================================================================

#[test]
fn test_decision_boundaries() {
    let scorer = MatchScorer::default();
    assert_eq!(scorer.decide(58.0), Decision::Match);
    assert_eq!(scorer.decide(57.999), Decision::Uncertain);
    assert_eq!(scorer.decide(45.0), Decision::Uncertain);
    assert_eq!(scorer.decide(44.999), Decision::NoMatch);
    assert_eq!(scorer.decide(100.0), Decision::Match);
    assert_eq!(scorer.decide(0.0), Decision::NoMatch);
}

#[test]
fn test_fuse_weights() {
    let scorer = MatchScorer::new(ScoringConfig::default());
    let ones = FeatureScores {
        orientation: 1.0,
        gabor: 1.0,
        frequency: 1.0,
        texture: 1.0,
        pixel: 1.0,
    };
    assert!((scorer.fuse(&ones) - 100.0).abs() < 1e-9);

    let only_orientation = FeatureScores {
        orientation: 1.0,
        ..Default::default()
    };
    assert!((scorer.fuse(&only_orientation) - 30.0).abs() < 1e-9);

    let nan = FeatureScores {
        pixel: f64::NAN,
        ..ones
    };
    assert_eq!(scorer.fuse(&nan), 0.0);
}

#[test]
fn test_decision_serializes_upper_snake() {
    assert_eq!(serde_json::to_string(&Decision::Match).unwrap(), "\"MATCH\"");
    assert_eq!(serde_json::to_string(&Decision::NoMatch).unwrap(), "\"NO_MATCH\"");
    assert_eq!(Decision::Uncertain.to_string(), "UNCERTAIN");
    let back: Decision = serde_json::from_str("\"UNCERTAIN\"").unwrap();
    assert_eq!(back, Decision::Uncertain);
}

// ============================================================================
// Matcher
// ============================================================================

#[test]
fn test_self_alignment_pixel_similarity() {
    let matcher = HybridMatcher::default();
    let ridges = matcher
        .ridges(&Image::from(ridge_pattern(256, 0.1)), false)
        .unwrap();
    let aligned = Aligner::default().align(&ridges, &ridges);

    assert_eq!(aligned.alignment.rotation_degrees, 0.0);
    assert!(aligned.alignment.translation.length() < 0.5);
    let similarity = pixel_similarity(&aligned.image, &ridges);
    assert!(similarity > 0.95, "pixel similarity = {}", similarity);
}

#[test]
fn test_rotated_translated_copy_matches() {
    init_tracing();
    let probe = ridge_pattern(256, 0.1);
    let candidate = rotate_translate(&probe, 10.0, DVec2::new(5.0, 0.0));

    let result = HybridMatcher::default()
        .match_candidates(
            &Image::from(probe),
            &[Candidate::new("rotated", candidate)],
            0.7,
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(result.candidates.len(), 1);
    let best = &result.candidates[0];
    let rotation = best.alignment.unwrap().rotation_degrees;
    assert!((rotation + 10.0).abs() <= 4.0, "rotation = {}", rotation);
    assert!(best.score >= 58.0, "score = {}, {:?}", best.score, best.feature_scores);
    assert_eq!(best.decision, Decision::Match);
}

#[test]
fn test_results_sorted_and_blank_candidate_fails_safe() {
    let probe = ridge_pattern(256, 0.1);
    let candidates = [
        Candidate::new("blank", GrayImage::new_default(256, 256)),
        Candidate::new("other", ridge_pattern(256, 0.06)),
        Candidate::new("same", probe.clone()),
    ];

    let result = HybridMatcher::default()
        .match_candidates(&Image::from(probe), &candidates, 0.5, &CancelToken::new())
        .unwrap();

    assert_eq!(result.candidates.len(), 3);
    assert_eq!(result.threshold_used, 0.5);
    assert_eq!(result.best().unwrap().candidate_id, "same");
    assert!(
        result
            .candidates
            .windows(2)
            .all(|w| w[0].score >= w[1].score)
    );

    let blank = result
        .candidates
        .iter()
        .find(|c| c.candidate_id == "blank")
        .unwrap();
    assert_eq!(blank.score, 0.0);
    assert_eq!(blank.decision, Decision::NoMatch);
    assert!(blank.alignment.is_none());
}

#[test]
fn test_empty_candidate_set() {
    let result = HybridMatcher::default()
        .match_candidates(&Image::from(ridge_pattern(64, 0.1)), &[], 0.3, &CancelToken::new())
        .unwrap();
    assert!(result.candidates.is_empty());
    assert_eq!(result.threshold_used, 0.3);
    assert!(result.best().is_none());
}

#[test]
fn test_blank_probe_scores_everything_zero() {
    let candidates = [Candidate::new("a", ridge_pattern(128, 0.1))];
    let result = HybridMatcher::default()
        .match_candidates(
            &Image::from(GrayImage::new_default(0, 0)),
            &candidates,
            0.5,
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.candidates[0].score, 0.0);
    assert_eq!(result.candidates[0].decision, Decision::NoMatch);
}

#[test]
fn test_cancelled_run() {
    let token = CancelToken::new();
    token.cancel();
    let candidates = [
        Candidate::new("a", ridge_pattern(64, 0.1)),
        Candidate::new("b", ridge_pattern(64, 0.1)),
    ];
    let matcher: Box<dyn Matcher> = Box::new(HybridMatcher::default());
    assert_eq!(matcher.name(), "hybrid");

    let err = matcher
        .match_candidates(&Image::from(ridge_pattern(64, 0.1)), &candidates, 0.5, &token)
        .unwrap_err();
    assert_eq!(
        err,
        MatchError::Cancelled {
            completed: 0,
            total: 2
        }
    );
}
