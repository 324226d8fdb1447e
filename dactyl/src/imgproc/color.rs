use serde::{Deserialize, Serialize};

use crate::image::{ColorImage, GrayImage, Mask};

/// HSV triple with hue in degrees `[0, 360)` and saturation/value in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub const fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }
}

/// ITU-R BT.601 luma, rounded.
pub fn rgb_to_gray(img: &ColorImage) -> GrayImage {
    img.map(|&[r, g, b]| {
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        luma.round().min(255.0) as u8
    })
}

pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> Hsv {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let s = if max > 0.0 { diff / max * 255.0 } else { 0.0 };

    let h = if diff <= 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    Hsv { h, s, v: max }
}

/// Pixels whose HSV value lies inside `[lower, upper]` on every channel (inclusive).
pub fn hsv_in_range(img: &ColorImage, lower: Hsv, upper: Hsv) -> Mask {
    Mask::from_fn(img.width(), img.height(), |x, y| {
        let hsv = rgb_to_hsv(img[(x, y)]);
        (lower.h..=upper.h).contains(&hsv.h)
            && (lower.s..=upper.s).contains(&hsv.s)
            && (lower.v..=upper.v).contains(&hsv.v)
    })
}
