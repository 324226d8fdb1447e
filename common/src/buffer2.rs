//! Owned row-major 2D grid.
//!
//! Pixel `(x, y)` lives at `y * width + x`. Used for images, feature grids
//! and intermediate filter buffers alike.

use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::slice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Build a buffer by evaluating `f(x, y)` for every cell in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }

    /// Value at `(x, y)` with coordinates clamped into the grid (replicated border).
    ///
    /// The buffer must not be empty.
    #[inline]
    pub fn get_clamped(&self, x: isize, y: isize) -> &T {
        let cx = x.clamp(0, self.width as isize - 1) as usize;
        let cy = y.clamp(0, self.height as isize - 1) as usize;
        &self.pixels[cy * self.width + cx]
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.pixels[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.pixels
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.pixels.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.pixels.iter_mut()
    }

    /// Apply `f` to every cell, producing a buffer of the same dimensions.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Buffer2<U> {
        Buffer2 {
            pixels: self.pixels.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<T: Clone> Buffer2<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn fill(&mut self, value: T) {
        self.pixels.fill(value);
    }

    /// Copy the half-open rectangle `[x0, x1) × [y0, y1)` into a new buffer.
    pub fn crop(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        assert!(
            x0 <= x1 && x1 <= self.width && y0 <= y1 && y1 <= self.height,
            "crop rectangle out of bounds"
        );
        let width = x1 - x0;
        let height = y1 - y0;
        let mut pixels = Vec::with_capacity(width * height);
        for y in y0..y1 {
            pixels.extend_from_slice(&self.row(y)[x0..x1]);
        }
        Self {
            pixels,
            width,
            height,
        }
    }
}

impl<T: Default + Clone> Buffer2<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new_filled(width, height, T::default())
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.pixels[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.pixels[y * self.width + x]
    }
}

impl<T> Index<usize> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.pixels[idx]
    }
}

impl<T> IndexMut<usize> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        &mut self.pixels[idx]
    }
}

impl<T> Deref for Buffer2<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.pixels
    }
}

impl<T> DerefMut for Buffer2<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pixels
    }
}

impl<'a, T> IntoIterator for &'a Buffer2<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.pixels.iter()
    }
}

impl<T> From<Buffer2<T>> for Vec<T> {
    #[inline]
    fn from(buffer: Buffer2<T>) -> Self {
        buffer.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stores_dimensions() {
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.dimensions(), (3, 2));
        assert!(!buf.is_empty());
    }

    #[test]
    #[should_panic(expected = "pixels length must equal width * height")]
    fn test_new_panics_on_size_mismatch() {
        Buffer2::new(3, 2, vec![1, 2, 3]);
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let buf = Buffer2::from_fn(3, 2, |x, y| (y * 10 + x) as u8);
        assert_eq!(buf.pixels(), &[0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn test_get_and_index_agree() {
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(*buf.get(2, 1), 60);
        assert_eq!(buf[(2, 1)], 60);
        assert_eq!(buf[buf.index(2, 1)], 60);
    }

    #[test]
    fn test_get_clamped_replicates_border() {
        let buf = Buffer2::new(2, 2, vec![1, 2, 3, 4]);
        assert_eq!(*buf.get_clamped(-5, -5), 1);
        assert_eq!(*buf.get_clamped(9, 0), 2);
        assert_eq!(*buf.get_clamped(0, 9), 3);
        assert_eq!(*buf.get_clamped(1, 1), 4);
    }

    #[test]
    fn test_rows() {
        let mut buf = Buffer2::new(3, 2, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(buf.row(1), &[4, 5, 6]);
        buf.row_mut(0)[1] = 9;
        assert_eq!(buf.row(0), &[1, 9, 3]);
    }

    #[test]
    fn test_map_keeps_dimensions() {
        let buf = Buffer2::new(2, 2, vec![1u8, 2, 3, 4]);
        let mapped = buf.map(|&v| v as f32 * 0.5);
        assert_eq!(mapped.dimensions(), (2, 2));
        assert_eq!(mapped.pixels(), &[0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_crop() {
        let buf = Buffer2::from_fn(4, 4, |x, y| y * 4 + x);
        let crop = buf.crop(1, 1, 3, 4);
        assert_eq!(crop.dimensions(), (2, 3));
        assert_eq!(crop.pixels(), &[5, 6, 9, 10, 13, 14]);
    }

    #[test]
    #[should_panic(expected = "crop rectangle out of bounds")]
    fn test_crop_out_of_bounds_panics() {
        let buf = Buffer2::new_filled(2, 2, 0u8);
        buf.crop(0, 0, 3, 2);
    }

    #[test]
    fn test_fill_and_default() {
        let mut buf: Buffer2<f32> = Buffer2::new_default(4, 3);
        assert!(buf.iter().all(|&v| v == 0.0));
        buf.fill(2.5);
        assert!(buf.iter().all(|&v| v == 2.5));
    }
}
