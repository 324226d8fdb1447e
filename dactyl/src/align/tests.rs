use glam::{DAffine2, DVec2};

use super::phase::transpose_inplace;
use super::*;
use crate::imgproc::{to_f32, warp_affine};
use crate::testing::{ridge_pattern, rotate_translate};

fn mean_abs_diff(a: &GrayImage, b: &GrayImage) -> f64 {
    let total: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as f64 - y as f64).abs())
        .sum();
    total / a.len() as f64
}

// ============================================================================
// Phase correlation
// ============================================================================

#[test]
fn test_hann_window_shape() {
    let w = hann_window(16);
    assert_eq!(w.len(), 16);
    assert!(w[0].abs() < 1e-6);
    assert!((w[8] - 1.0).abs() < 1e-6);
    assert!((w[4] - w[12]).abs() < 1e-6);
}

#[test]
fn test_transpose_inplace() {
    let mut data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9];
    transpose_inplace(&mut data, 3);
    assert_eq!(data, vec![1, 4, 7, 2, 5, 8, 3, 6, 9]);
}

#[test]
fn test_fft_size_is_power_of_two() {
    assert_eq!(PhaseCorrelator::new(100, 60, true, true).fft_size(), 128);
    assert_eq!(PhaseCorrelator::new(256, 256, true, true).fft_size(), 256);
}

#[test]
fn test_correlate_identical_images() {
    let image = to_f32(&ridge_pattern(128, 0.1));
    let correlator = PhaseCorrelator::new(128, 128, true, true);
    let result = correlator.correlate(&image, &image).unwrap();

    assert!(result.shift.length() < 0.1, "shift = {:?}", result.shift);
    assert!(result.peak > 0.9, "peak = {}", result.peak);
}

#[test]
fn test_correlate_shift_sign() {
    // target(x) = reference(x - d)
    let reference = ridge_pattern(128, 0.1);
    let d = DVec2::new(5.0, -3.0);
    let target = warp_affine(&reference, &DAffine2::from_translation(d), 128, 128);

    let correlator = PhaseCorrelator::new(128, 128, true, true);
    let result = correlator
        .correlate(&to_f32(&reference), &to_f32(&target))
        .unwrap();

    assert!(
        (result.shift - d).length() < 0.5,
        "expected {:?}, got {:?}",
        d,
        result.shift
    );
}

#[test]
fn test_correlate_size_mismatch() {
    let correlator = PhaseCorrelator::new(8, 8, true, true);
    assert!(correlator.correlate(&[0.0; 64], &[0.0; 63]).is_none());
}

#[test]
fn test_correlate_non_square_input() {
    let reference = ridge_pattern(96, 0.1).crop(0, 16, 96, 80);
    let d = DVec2::new(-4.0, 2.0);
    let target = warp_affine(&reference, &DAffine2::from_translation(d), 96, 64);

    let correlator = PhaseCorrelator::new(96, 64, true, true);
    let result = correlator
        .correlate(&to_f32(&reference), &to_f32(&target))
        .unwrap();
    assert!((result.shift - d).length() < 0.5, "got {:?}", result.shift);
}

// ============================================================================
// Aligner
// ============================================================================

#[test]
fn test_alignment_transform_undoes_shift() {
    let alignment = Alignment {
        rotation_degrees: 0.0,
        translation: DVec2::new(3.0, 4.0),
        peak: 1.0,
    };
    let p = alignment
        .transform(DVec2::new(10.0, 10.0))
        .transform_point2(DVec2::new(20.0, 20.0));
    assert!((p - DVec2::new(17.0, 16.0)).length() < 1e-9);
}

#[test]
fn test_self_alignment_is_identity() {
    let image = ridge_pattern(128, 0.1);
    let aligned = Aligner::default().align(&image, &image);

    assert_eq!(aligned.alignment.rotation_degrees, 0.0);
    assert!(aligned.alignment.translation.length() < 0.1);
    assert_eq!(aligned.image.dimensions(), image.dimensions());
    assert!(mean_abs_diff(&aligned.image, &image) < 1.0);
}

#[test]
fn test_recovers_rotation_and_translation() {
    crate::testing::init_tracing();
    let probe = ridge_pattern(256, 0.1);
    let candidate = rotate_translate(&probe, 10.0, DVec2::new(5.0, 0.0));

    let aligned = Aligner::default().align(&probe, &candidate);

    let rotation = aligned.alignment.rotation_degrees;
    assert!(
        (rotation + 10.0).abs() <= 4.0,
        "rotation = {}",
        rotation
    );
    assert!(
        mean_abs_diff(&aligned.image, &probe) < mean_abs_diff(&candidate, &probe),
        "alignment did not bring the candidate closer to the probe"
    );
}

#[test]
fn test_output_has_reference_size() {
    let reference = ridge_pattern(128, 0.1);
    let target = ridge_pattern(100, 0.1);
    let aligned = Aligner::default().align(&reference, &target);
    assert_eq!(aligned.image.dimensions(), (128, 128));
}

#[test]
fn test_empty_target_gives_identity() {
    let reference = ridge_pattern(64, 0.1);
    let aligned = Aligner::default().align(&reference, &GrayImage::new_default(0, 0));

    assert_eq!(aligned.alignment, Alignment::identity());
    assert_eq!(aligned.image.dimensions(), (64, 64));
    assert!(aligned.image.iter().all(|&v| v == 0));
}
