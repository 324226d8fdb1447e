use super::*;

use glam::DVec2;

use crate::image::ColorImage;

// ============================================================================
// Helpers
// ============================================================================

fn square_mask(size: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> Mask {
    Mask::from_fn(size, size, |x, y| x >= x0 && x < x1 && y >= y0 && y < y1)
}

// ============================================================================
// Border and conversion helpers
// ============================================================================

#[test]
fn test_reflect101() {
    assert_eq!(reflect101(-1, 5), 1);
    assert_eq!(reflect101(-2, 5), 2);
    assert_eq!(reflect101(5, 5), 3);
    assert_eq!(reflect101(6, 5), 2);
    assert_eq!(reflect101(3, 5), 3);
    assert_eq!(reflect101(-7, 1), 0);
}

#[test]
fn test_normalize_min_max() {
    let img = Buffer2::new(3, 1, vec![-1.0f32, 0.0, 1.0]);
    assert_eq!(normalize_min_max(&img).pixels(), &[0, 128, 255]);

    let flat = Buffer2::new_filled(4, 4, 3.0f32);
    assert!(normalize_min_max(&flat).iter().all(|&v| v == 0));
}

#[test]
fn test_region_mean() {
    let img: GrayImage = Buffer2::from_fn(4, 4, |x, _| if x < 2 { 0 } else { 200 });
    assert_eq!(region_mean(&img, 2, 0, 4, 4), 200.0);
    assert_eq!(region_mean(&img, 0, 0, 4, 4), 100.0);
    assert_eq!(region_mean(&img, 1, 1, 1, 3), 0.0);
}

// ============================================================================
// Colour
// ============================================================================

#[test]
fn test_rgb_to_gray_weights() {
    let img: ColorImage = Buffer2::new(3, 1, vec![[255, 0, 0], [0, 255, 0], [0, 0, 255]]);
    assert_eq!(rgb_to_gray(&img).pixels(), &[76, 150, 29]);
}

#[test]
fn test_rgb_to_hsv_primaries() {
    let red = rgb_to_hsv([255, 0, 0]);
    assert_eq!((red.h, red.s, red.v), (0.0, 255.0, 255.0));

    let green = rgb_to_hsv([0, 255, 0]);
    assert!((green.h - 120.0).abs() < 1e-4);

    let blue = rgb_to_hsv([0, 0, 255]);
    assert!((blue.h - 240.0).abs() < 1e-4);

    let gray = rgb_to_hsv([90, 90, 90]);
    assert_eq!((gray.h, gray.s, gray.v), (0.0, 0.0, 90.0));
}

#[test]
fn test_rgb_to_hsv_wraps_negative_hue() {
    // magenta-ish red: max is R, G < B
    let hsv = rgb_to_hsv([255, 0, 51]);
    assert!(hsv.h > 340.0 && hsv.h < 360.0, "hue {}", hsv.h);
}

#[test]
fn test_hsv_in_range_is_inclusive() {
    let img: ColorImage = Buffer2::new(2, 1, vec![[210, 140, 120], [40, 90, 200]]);
    let mask = hsv_in_range(&img, Hsv::new(0.0, 40.0, 80.0), Hsv::new(20.0, 160.0, 255.0));
    assert!(mask.get_xy(0, 0));
    assert!(!mask.get_xy(1, 0));

    let white: ColorImage = Buffer2::new_filled(1, 1, [255, 255, 255]);
    let mask = hsv_in_range(&white, Hsv::new(0.0, 0.0, 255.0), Hsv::new(0.0, 0.0, 255.0));
    assert!(mask.get_xy(0, 0));
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_bilinear_identity() {
    let img: GrayImage = Buffer2::from_fn(7, 5, |x, y| (x * 30 + y * 7) as u8);
    assert_eq!(resize_bilinear(&img, 7, 5), img);
}

#[test]
fn test_resize_bilinear_identity_tall_frame() {
    let img: GrayImage = Buffer2::from_fn(5, 97, |x, y| ((x * 40 + y * 3) % 256) as u8);
    assert_eq!(resize_bilinear(&img, 5, 97), img);
}

#[test]
fn test_resize_bilinear_constant() {
    let img: ColorImage = Buffer2::new_filled(10, 6, [10, 200, 33]);
    let out = resize_bilinear(&img, 23, 4);
    assert_eq!(out.dimensions(), (23, 4));
    assert!(out.iter().all(|&p| p == [10, 200, 33]));
}

#[test]
fn test_resize_bilinear_downscale_averages_pairs() {
    let img = Buffer2::new(4, 1, vec![0.0f32, 100.0, 200.0, 300.0]);
    let out = resize_bilinear(&img, 2, 1);
    assert!((out[0] - 50.0).abs() < 1e-4);
    assert!((out[1] - 250.0).abs() < 1e-4);
}

#[test]
fn test_resize_empty_source() {
    let img: GrayImage = Buffer2::new_default(0, 0);
    let out = resize_bilinear(&img, 8, 8);
    assert!(out.iter().all(|&v| v == 0));
}

#[test]
fn test_resize_nearest_mask() {
    let mask = Mask::from_fn(2, 2, |x, y| x == y);
    let up = resize_nearest_mask(&mask, 4, 4);
    assert!(up.get_xy(0, 0) && up.get_xy(1, 1) && up.get_xy(3, 3) && up.get_xy(2, 3));
    assert!(!up.get_xy(3, 0) && !up.get_xy(0, 2));
    assert_eq!(up.count_ones(), 8);
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_gaussian_kernel_default_sigma() {
    let kernel = gaussian_kernel_1d(5, 0.0);
    assert_eq!(kernel.len(), 5);
    let sum: f32 = kernel.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
    // sigma = 0.3 * (2 - 1) + 0.8 = 1.1
    let expected_ratio = (-1.0f32 / (2.0 * 1.1 * 1.1)).exp();
    assert!((kernel[1] / kernel[2] - expected_ratio).abs() < 1e-5);
}

#[test]
fn test_gaussian_kernel_size_from_sigma() {
    assert_eq!(gaussian_kernel_1d(0, 1.0).len(), 7);
}

#[test]
#[should_panic(expected = "Kernel size must be odd")]
fn test_gaussian_kernel_even_panics() {
    gaussian_kernel_1d(4, 1.0);
}

#[test]
fn test_gaussian_blur_preserves_constant() {
    let img: GrayImage = Buffer2::new_filled(12, 9, 77);
    assert!(gaussian_blur(&img, 7, 0.0).iter().all(|&v| v == 77));
}

#[test]
fn test_gaussian_blur_preserves_mass_of_impulse() {
    let mut img = Buffer2::new_default(21, 21);
    img[(10, 10)] = 1000.0f32;
    let out = gaussian_blur_f32(&img, 5, 1.0);
    let sum: f32 = out.iter().sum();
    assert!((sum - 1000.0).abs() < 1e-2);
    assert!(out[(10, 10)] > out[(11, 10)]);
    assert!((out[(11, 10)] - out[(10, 11)]).abs() < 1e-4);
}

#[test]
fn test_gaussian_blur_keeps_linear_ramp_across_row_chunks() {
    // tall frame so the vertical pass spans many row chunks
    let img = Buffer2::from_fn(7, 61, |_, y| y as f32);
    let out = gaussian_blur_f32(&img, 5, 1.0);
    assert_eq!(out.dimensions(), (7, 61));
    for y in 2..59 {
        for x in 0..7 {
            assert!((out[(x, y)] - y as f32).abs() < 1e-3, "({}, {}) = {}", x, y, out[(x, y)]);
        }
    }
}

#[test]
fn test_median_blur_removes_salt() {
    let mut img: GrayImage = Buffer2::new_filled(9, 9, 50);
    img[(4, 4)] = 255;
    img[(0, 0)] = 0;
    let out = median_blur(&img, 3);
    assert!(out.iter().all(|&v| v == 50));
}

#[test]
fn test_median_blur_mask_majority() {
    let mut mask = square_mask(20, 5, 5, 15, 15);
    mask.set_xy(1, 1, true);
    mask.set_xy(10, 10, false);
    let out = median_blur_mask(&mask, 5);
    assert!(!out.get_xy(1, 1));
    assert!(out.get_xy(10, 10));
    assert!(out.get_xy(7, 7));
    // the corner of a square loses the majority
    assert!(!out.get_xy(5, 5));
}

// ============================================================================
// Morphology
// ============================================================================

#[test]
fn test_ellipse_3x3_is_cross() {
    let se = StructuringElement::ellipse(3, 3);
    assert!(se.contains(0, 0) && se.contains(-1, 0) && se.contains(0, 1));
    assert!(!se.contains(1, 1) && !se.contains(-1, -1));
}

#[test]
fn test_ellipse_9x9_shape() {
    let se = StructuringElement::ellipse(9, 9);
    assert!(se.contains(0, -4) && se.contains(0, 4));
    assert!(!se.contains(1, -4));
    assert!(se.contains(-4, 0) && se.contains(4, 0));
    assert!(!se.contains(4, 4));
}

#[test]
fn test_erode_dilate_rect() {
    let mask = square_mask(20, 5, 5, 15, 15);
    let se = StructuringElement::rect(3, 3);
    assert_eq!(erode(&mask, &se, 1), square_mask(20, 6, 6, 14, 14));
    assert_eq!(dilate(&mask, &se, 1), square_mask(20, 4, 4, 16, 16));
    assert_eq!(erode(&mask, &se, 2), square_mask(20, 7, 7, 13, 13));
}

#[test]
fn test_erode_ignores_frame_border() {
    let full = Mask::new_filled(10, 10, true);
    let se = StructuringElement::ellipse(9, 9);
    assert_eq!(erode(&full, &se, 2), full);
}

#[test]
fn test_open_removes_specks_close_fills_holes() {
    let se = StructuringElement::ellipse(3, 3);

    let mut specks = square_mask(30, 10, 10, 20, 20);
    specks.set_xy(2, 2, true);
    let opened = open(&specks, &se, 1);
    assert!(!opened.get_xy(2, 2));
    assert!(opened.get_xy(15, 15));

    let mut holed = square_mask(30, 10, 10, 20, 20);
    holed.set_xy(15, 15, false);
    let closed = close(&holed, &se, 1);
    assert!(closed.get_xy(15, 15));
}

// ============================================================================
// CLAHE
// ============================================================================

#[test]
fn test_clahe_keeps_size_and_stretches_contrast() {
    let img: GrayImage = Buffer2::from_fn(64, 64, |x, _| 100 + (x % 8) as u8 * 4);
    let out = clahe(&img, 8, 8, 3.0);
    assert_eq!(out.dimensions(), (64, 64));
    let in_range = 28;
    let out_min = *out.iter().min().unwrap();
    let out_max = *out.iter().max().unwrap();
    assert!((out_max - out_min) as i32 > in_range);
}

#[test]
fn test_clahe_flat_stays_flat() {
    let img: GrayImage = Buffer2::new_filled(32, 32, 90);
    let out = clahe(&img, 8, 8, 3.0);
    let first = out[0];
    assert!(out.iter().all(|&v| v == first));
}

#[test]
fn test_clahe_non_divisible_frame() {
    let img: GrayImage = Buffer2::from_fn(13, 7, |x, y| (x * 19 + y * 11) as u8);
    assert_eq!(clahe(&img, 8, 8, 3.0).dimensions(), (13, 7));
}

#[test]
fn test_clahe_empty() {
    let img: GrayImage = Buffer2::new_default(0, 0);
    assert!(clahe(&img, 8, 8, 3.0).is_empty());
}

// ============================================================================
// Gradients, threshold
// ============================================================================

#[test]
fn test_sobel_ramp() {
    let img = Buffer2::from_fn(8, 8, |x, _| x as f32 * 2.0);
    let g = sobel(&img);
    // interior: (2 * 2) * (1 + 2 + 1) = 16
    assert_eq!(g.gx[(4, 4)], 16.0);
    assert_eq!(g.gy[(4, 4)], 0.0);
    // reflect-101 border mirrors the ramp, so the derivative vanishes at the edge
    assert_eq!(g.gx[(0, 4)], 0.0);
}

#[test]
fn test_adaptive_threshold_flat_is_black() {
    let img: GrayImage = Buffer2::new_filled(20, 20, 120);
    let out = adaptive_threshold_gaussian(&img, 15, -2.0);
    assert!(out.iter().all(|&v| v == 0));
}

#[test]
fn test_adaptive_threshold_bright_line() {
    let img: GrayImage = Buffer2::from_fn(30, 30, |x, _| if x == 15 { 200 } else { 60 });
    let out = adaptive_threshold_gaussian(&img, 15, -2.0);
    assert_eq!(out[(15, 10)], 255);
    assert_eq!(out[(5, 10)], 0);
    assert_eq!(out[(14, 10)], 0);
}

// ============================================================================
// Warp
// ============================================================================

#[test]
fn test_warp_identity() {
    let img: GrayImage = Buffer2::from_fn(9, 7, |x, y| (x * 20 + y) as u8);
    assert_eq!(warp_affine(&img, &glam::DAffine2::IDENTITY, 9, 7), img);
}

#[test]
fn test_warp_translation_zero_border() {
    let img: GrayImage = Buffer2::new_filled(10, 10, 100);
    let shift = glam::DAffine2::from_translation(DVec2::new(3.0, 0.0));
    let out = warp_affine(&img, &shift, 10, 10);
    assert_eq!(out[(1, 5)], 0);
    assert_eq!(out[(3, 5)], 100);
    assert_eq!(out[(9, 5)], 100);
}

#[test]
fn test_rotation_about_quarter_turn() {
    let rot = rotation_about(DVec2::new(10.0, 10.0), 90.0);
    // counter-clockwise on screen: a point to the right of centre moves up
    let p = rot.transform_point2(DVec2::new(15.0, 10.0));
    assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
    let c = rot.transform_point2(DVec2::new(10.0, 10.0));
    assert!((c - DVec2::new(10.0, 10.0)).length() < 1e-9);
}

// ============================================================================
// Labeling
// ============================================================================

#[test]
fn test_label_components_diagonal_connects() {
    let mask = Mask::from_fn(5, 5, |x, y| x == y);
    let comps = label_components(&mask);
    assert_eq!(comps.stats.len(), 1);
    assert_eq!(comps.stats[0].area, 5);
    assert_eq!(
        (comps.stats[0].left, comps.stats[0].top, comps.stats[0].right, comps.stats[0].bottom),
        (0, 0, 5, 5)
    );
}

#[test]
fn test_label_components_u_shape_merges() {
    // Two arms joined at the bottom: provisional labels must merge.
    let mask = Mask::from_fn(7, 6, |x, y| x == 1 || x == 5 || (y == 5 && (1..=5).contains(&x)));
    let comps = label_components(&mask);
    assert_eq!(comps.stats.len(), 1);
    assert_eq!(comps.stats[0].area, 6 + 6 + 3);
    assert!(comps.labels.iter().all(|&l| l <= 1));
}

#[test]
fn test_label_components_separate_and_select() {
    let mask = Mask::from_fn(12, 6, |x, y| (x < 3 && y < 3) || (x >= 6 && x < 12 && y >= 2));
    let comps = label_components(&mask);
    assert_eq!(comps.stats.len(), 2);
    assert_eq!(comps.stats[0].area, 9);
    assert_eq!(comps.stats[1].area, 24);
    assert_eq!(comps.largest().map(|s| s.label), Some(2));

    let big = comps.select(|s| s.area > 10);
    assert_eq!(big.count_ones(), 24);
    assert!(!big.get_xy(0, 0));
}

#[test]
fn test_label_components_empty() {
    let comps = label_components(&Mask::new_default(8, 8));
    assert!(comps.stats.is_empty());
    assert!(comps.largest().is_none());
}
