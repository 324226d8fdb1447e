//! Synthetic captures and ridge patterns for tests.

use common::Buffer2;
use glam::{DAffine2, DVec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::image::{ColorImage, GrayImage, Mask};
use crate::imgproc::{rotation_about, warp_affine};

/// Initialize tracing for tests. Safe to call more than once.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Upright elliptical "finger" covering the middle of the frame.
pub fn finger_truth(width: usize, height: usize) -> Mask {
    let (cx, cy) = (width as f64 * 0.5, height as f64 * 0.55);
    let (rx, ry) = (width as f64 * 0.2, height as f64 * 0.35);
    Mask::from_fn(width, height, |x, y| {
        let dx = (x as f64 - cx) / rx;
        let dy = (y as f64 - cy) / ry;
        dx * dx + dy * dy <= 1.0
    })
}

/// Skin-toned finger on a bluish background with a little sensor noise.
pub fn finger_capture(width: usize, height: usize, seed: u64) -> (ColorImage, Mask) {
    let truth = finger_truth(width, height);
    let mut rng = StdRng::seed_from_u64(seed);
    let image = Buffer2::from_fn(width, height, |x, y| {
        let n: i16 = rng.random_range(-6..=6);
        let base: [i16; 3] = if truth.get_xy(x, y) {
            [205, 140, 120]
        } else {
            [40, 60, 110]
        };
        base.map(|v| (v + n).clamp(0, 255) as u8)
    });
    (image, truth)
}

/// Loop-like ridge pattern inside an elliptical finger outline on black.
///
/// Ridges have a period of about `1 / frequency` pixels; the pattern has no
/// rotational symmetry so rotations are recoverable.
pub fn ridge_pattern(size: usize, frequency: f64) -> GrayImage {
    let s = size as f64;
    let (ex, ey) = (s * 0.5, s * 0.55);
    let (rx, ry) = (s * 0.32, s * 0.42);
    let (core_x, core_y) = (s * 0.47, s * 0.42);
    Buffer2::from_fn(size, size, |x, y| {
        let (fx, fy) = (x as f64, y as f64);
        let ux = (fx - ex) / rx;
        let uy = (fy - ey) / ry;
        if ux * ux + uy * uy > 1.0 {
            return 0;
        }
        let dx = fx - core_x;
        let dy = fy - core_y;
        let d = (dx * dx + 1.8 * dy * dy).sqrt() + 3.0 * (fx / 23.0).sin();
        let v = 128.0 + 100.0 * (std::f64::consts::TAU * frequency * d).cos();
        v.round() as u8
    })
}

/// `img` rotated by `degrees` about its centre, then shifted by `shift`.
pub fn rotate_translate(img: &GrayImage, degrees: f64, shift: DVec2) -> GrayImage {
    let center = DVec2::new(img.width() as f64 * 0.5, img.height() as f64 * 0.5);
    let transform = DAffine2::from_translation(shift) * rotation_about(center, degrees);
    warp_affine(img, &transform, img.width(), img.height())
}
