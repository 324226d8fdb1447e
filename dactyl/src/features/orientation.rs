use std::f64::consts::PI;

use common::Buffer2;
use serde::{Deserialize, Serialize};

use crate::imgproc::Gradients;

/// Dominant orientation of one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationBlock {
    /// Undirected angle in `[0, π)`.
    pub angle: f64,
    /// Strength of the dominant direction in `[0, 1]`.
    pub coherence: f64,
}

/// Per-block orientation estimates over the complete blocks of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationField {
    pub block_size: usize,
    pub blocks: Buffer2<OrientationBlock>,
}

impl OrientationField {
    /// Estimate from precomputed gradients. Partial blocks at the right and
    /// bottom edges are dropped.
    pub fn from_gradients(gradients: &Gradients, block_size: usize) -> Self {
        let (width, height) = gradients.gx.dimensions();
        let blocks_x = width / block_size;
        let blocks_y = height / block_size;
        let blocks = Buffer2::from_fn(blocks_x, blocks_y, |bx, by| {
            block_orientation(
                gradients,
                bx * block_size,
                by * block_size,
                block_size,
                block_size,
            )
        });
        Self { block_size, blocks }
    }

    pub fn blocks_x(&self) -> usize {
        self.blocks.width()
    }

    pub fn blocks_y(&self) -> usize {
        self.blocks.height()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Doubled-angle least-squares orientation of the gradient inside
/// `[x0, x0 + w) × [y0, y0 + h)`.
///
/// `θ = ½·atan2(2Σgxgy, Σgx² − Σgy²)`, coherence `= |(vx, vy)| / (Σgx² + Σgy²)`.
/// A block without gradient energy gets angle 0 and coherence 0.
pub fn block_orientation(
    gradients: &Gradients,
    x0: usize,
    y0: usize,
    w: usize,
    h: usize,
) -> OrientationBlock {
    let mut gxx = 0.0f64;
    let mut gyy = 0.0f64;
    let mut gxy = 0.0f64;
    for y in y0..y0 + h {
        let row_x = &gradients.gx.row(y)[x0..x0 + w];
        let row_y = &gradients.gy.row(y)[x0..x0 + w];
        for (&gx, &gy) in row_x.iter().zip(row_y) {
            let (gx, gy) = (gx as f64, gy as f64);
            gxx += gx * gx;
            gyy += gy * gy;
            gxy += gx * gy;
        }
    }

    let energy = gxx + gyy;
    if energy <= f64::EPSILON {
        return OrientationBlock::default();
    }

    let vx = gxx - gyy;
    let vy = 2.0 * gxy;
    let mut angle = 0.5 * vy.atan2(vx);
    if angle < 0.0 {
        angle += PI;
    }
    if angle >= PI {
        angle -= PI;
    }
    let coherence = ((vx * vx + vy * vy).sqrt() / energy).clamp(0.0, 1.0);

    OrientationBlock { angle, coherence }
}

/// Absolute difference of two undirected angles, in `[0, π/2]`.
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).abs().rem_euclid(PI);
    if d > PI / 2.0 { PI - d } else { d }
}
