//! Axis-aligned region of interest in pixel coordinates.

use serde::{Deserialize, Serialize};

/// Half-open rectangle `[left, right) × [top, bottom)`.
///
/// A constructed `Roi` always has positive area; degenerate rectangles are
/// rejected by [`Roi::new_checked`] and callers substitute [`Roi::full`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roi {
    left: usize,
    top: usize,
    right: usize,
    bottom: usize,
}

impl Roi {
    /// Rectangle inside a `frame_width` x `frame_height` frame, or `None`
    /// when it is empty or sticks out of the frame.
    pub fn new_checked(
        left: usize,
        top: usize,
        right: usize,
        bottom: usize,
        frame_width: usize,
        frame_height: usize,
    ) -> Option<Self> {
        if left < right && top < bottom && right <= frame_width && bottom <= frame_height {
            Some(Self {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// The whole frame. A zero-sized frame yields a 1x1 rectangle at the origin.
    pub fn full(frame_width: usize, frame_height: usize) -> Self {
        Self {
            left: 0,
            top: 0,
            right: frame_width.max(1),
            bottom: frame_height.max(1),
        }
    }

    /// Rectangle from signed, possibly out-of-frame bounds, clamped into the frame.
    /// Falls back to the full frame when nothing is left after clamping.
    pub fn clamped(
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
        frame_width: usize,
        frame_height: usize,
    ) -> Self {
        let clamp_x = |v: f64| v.round().clamp(0.0, frame_width as f64) as usize;
        let clamp_y = |v: f64| v.round().clamp(0.0, frame_height as f64) as usize;
        Self::new_checked(
            clamp_x(left),
            clamp_y(top),
            clamp_x(right),
            clamp_y(bottom),
            frame_width,
            frame_height,
        )
        .unwrap_or_else(|| Self::full(frame_width, frame_height))
    }

    #[inline]
    pub fn left(&self) -> usize {
        self.left
    }

    #[inline]
    pub fn top(&self) -> usize {
        self.top
    }

    #[inline]
    pub fn right(&self) -> usize {
        self.right
    }

    #[inline]
    pub fn bottom(&self) -> usize {
        self.bottom
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.bottom - self.top
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.left + self.right) as f64 * 0.5,
            (self.top + self.bottom) as f64 * 0.5,
        )
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Map into a frame scaled by `factor` (e.g. back to source resolution).
    pub fn scaled(&self, factor: f64, frame_width: usize, frame_height: usize) -> Self {
        Self::clamped(
            self.left as f64 * factor,
            self.top as f64 * factor,
            self.right as f64 * factor,
            self.bottom as f64 * factor,
            frame_width,
            frame_height,
        )
    }
}
