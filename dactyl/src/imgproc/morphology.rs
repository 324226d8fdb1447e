//! Binary morphology on bit masks.
//!
//! Every structuring element row is a single contiguous span, which holds for
//! rectangles and ellipses. Erosion and dilation then reduce to one range
//! count per element row against per-row prefix sums. Pixels outside the
//! frame never influence the result.

use crate::image::Mask;

/// Structuring element described by one horizontal span per row, relative
/// to the anchor at the element centre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    width: usize,
    height: usize,
    /// `(dy, dx_min, dx_max)` with inclusive `dx` bounds.
    spans: Vec<(isize, isize, isize)>,
}

impl StructuringElement {
    pub fn rect(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "Structuring element must be non-empty");
        let (cx, cy) = ((width / 2) as isize, (height / 2) as isize);
        let spans = (0..height as isize)
            .map(|row| (row - cy, -cx, width as isize - 1 - cx))
            .collect();
        Self {
            width,
            height,
            spans,
        }
    }

    /// Ellipse inscribed in a `width × height` box, rasterised the same way as
    /// the common computer-vision toolkits do (`dx = round(c * sqrt(1 - dy²/r²))`).
    pub fn ellipse(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "Structuring element must be non-empty");
        let r = (height / 2) as isize;
        let c = (width / 2) as isize;
        if r == 0 || c == 0 {
            return Self::rect(width, height);
        }
        let inv_r2 = 1.0 / (r * r) as f64;

        let spans = (0..height as isize)
            .filter_map(|row| {
                let dy = row - r;
                if dy.abs() > r {
                    return None;
                }
                let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as isize;
                let j1 = (c - dx).max(0);
                let j2 = (c + dx + 1).min(width as isize);
                (j1 < j2).then_some((dy, j1 - c, j2 - 1 - c))
            })
            .collect();

        Self {
            width,
            height,
            spans,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether offset `(dx, dy)` from the anchor belongs to the element.
    pub fn contains(&self, dx: isize, dy: isize) -> bool {
        self.spans
            .iter()
            .any(|&(sy, lo, hi)| sy == dy && (lo..=hi).contains(&dx))
    }
}

/// Per-row inclusive prefix counts, `(width + 1)` entries per row.
fn row_prefix_counts(mask: &Mask) -> Vec<u32> {
    let (width, height) = mask.dimensions();
    let stride = width + 1;
    let mut prefix = vec![0u32; stride * height];
    for y in 0..height {
        let row = &mut prefix[y * stride..(y + 1) * stride];
        for x in 0..width {
            row[x + 1] = row[x] + mask.get_xy(x, y) as u32;
        }
    }
    prefix
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    Erode,
    Dilate,
}

fn morph_once(mask: &Mask, se: &StructuringElement, op: Op) -> Mask {
    let (width, height) = mask.dimensions();
    if mask.is_empty() {
        return mask.clone();
    }
    let stride = width + 1;
    let prefix = row_prefix_counts(mask);

    Mask::from_fn(width, height, |x, y| {
        for &(dy, lo, hi) in &se.spans {
            let ny = y as isize + dy;
            if ny < 0 || ny >= height as isize {
                continue;
            }
            let x0 = (x as isize + lo).max(0);
            let x1 = (x as isize + hi).min(width as isize - 1);
            if x0 > x1 {
                continue;
            }
            let row = &prefix[ny as usize * stride..];
            let count = row[x1 as usize + 1] - row[x0 as usize];
            match op {
                Op::Erode if count as isize != x1 - x0 + 1 => return false,
                Op::Dilate if count > 0 => return true,
                _ => {}
            }
        }
        op == Op::Erode
    })
}

fn repeat(mask: &Mask, se: &StructuringElement, iterations: usize, op: Op) -> Mask {
    let mut current = mask.clone();
    for _ in 0..iterations {
        current = morph_once(&current, se, op);
    }
    current
}

pub fn erode(mask: &Mask, se: &StructuringElement, iterations: usize) -> Mask {
    repeat(mask, se, iterations, Op::Erode)
}

pub fn dilate(mask: &Mask, se: &StructuringElement, iterations: usize) -> Mask {
    repeat(mask, se, iterations, Op::Dilate)
}

/// `iterations` erosions followed by as many dilations.
pub fn open(mask: &Mask, se: &StructuringElement, iterations: usize) -> Mask {
    dilate(&erode(mask, se, iterations), se, iterations)
}

/// `iterations` dilations followed by as many erosions.
pub fn close(mask: &Mask, se: &StructuringElement, iterations: usize) -> Mask {
    erode(&dilate(mask, se, iterations), se, iterations)
}
