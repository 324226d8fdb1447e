//! Bit-packed 2D buffer for boolean masks.
//!
//! Uses 1 bit per element instead of 1 byte. Bits past `width * height` in
//! the last word are always kept clear so word-level counts stay exact.

use std::ops::Index;

/// Number of bits per storage word.
const BITS_PER_WORD: usize = 64;

/// A 2D buffer storing boolean values packed as bits (LSB first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBuffer2 {
    words: Vec<u64>,
    width: usize,
    height: usize,
    len: usize,
}

impl BitBuffer2 {
    /// Create a new bit buffer filled with the given value.
    #[inline]
    pub fn new_filled(width: usize, height: usize, value: bool) -> Self {
        let len = width * height;
        let mut buffer = Self {
            words: vec![0; len.div_ceil(BITS_PER_WORD)],
            width,
            height,
            len,
        };
        buffer.fill(value);
        buffer
    }

    /// Create a new bit buffer with all bits cleared.
    #[inline]
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new_filled(width, height, false)
    }

    /// Create a bit buffer from a row-major slice of booleans.
    pub fn from_slice(width: usize, height: usize, data: &[bool]) -> Self {
        let len = width * height;
        assert_eq!(
            data.len(),
            len,
            "data length {} does not match dimensions {}x{}={}",
            data.len(),
            width,
            height,
            len
        );

        let mut words = vec![0u64; len.div_ceil(BITS_PER_WORD)];
        for (i, &value) in data.iter().enumerate() {
            if value {
                words[i / BITS_PER_WORD] |= 1u64 << (i % BITS_PER_WORD);
            }
        }

        Self {
            words,
            width,
            height,
            len,
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut buffer = Self::new_default(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    buffer.set_xy(x, y, true);
                }
            }
        }
        buffer
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
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len);
        (self.words[idx / BITS_PER_WORD] >> (idx % BITS_PER_WORD)) & 1 != 0
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: bool) {
        debug_assert!(idx < self.len);
        let bit = 1u64 << (idx % BITS_PER_WORD);
        if value {
            self.words[idx / BITS_PER_WORD] |= bit;
        } else {
            self.words[idx / BITS_PER_WORD] &= !bit;
        }
    }

    #[inline]
    pub fn get_xy(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < self.width && y < self.height);
        self.get(y * self.width + x)
    }

    #[inline]
    pub fn set_xy(&mut self, x: usize, y: usize, value: bool) {
        debug_assert!(x < self.width && y < self.height);
        self.set(y * self.width + x, value);
    }

    /// Fill all bits with the given value.
    pub fn fill(&mut self, value: bool) {
        let fill = if value { !0u64 } else { 0u64 };
        self.words.fill(fill);
        self.clear_tail();
    }

    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Number of set bits.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True when no bit is set.
    #[inline]
    pub fn is_all_clear(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Bitwise AND with another mask of the same dimensions.
    pub fn and(&self, other: &Self) -> Self {
        assert_eq!(self.dimensions(), other.dimensions(), "mask size mismatch");
        Self {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & b)
                .collect(),
            width: self.width,
            height: self.height,
            len: self.len,
        }
    }

    /// Bitwise OR with another mask of the same dimensions.
    pub fn or(&self, other: &Self) -> Self {
        assert_eq!(self.dimensions(), other.dimensions(), "mask size mismatch");
        Self {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a | b)
                .collect(),
            width: self.width,
            height: self.height,
            len: self.len,
        }
    }

    /// Inclusive bounding box `(x_min, y_min, x_max, y_max)` of the set bits.
    pub fn bounding_box(&self) -> Option<(usize, usize, usize, usize)> {
        let mut bbox: Option<(usize, usize, usize, usize)> = None;
        for idx in self.iter_ones() {
            let x = idx % self.width;
            let y = idx / self.width;
            bbox = Some(match bbox {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bbox
    }

    /// Iterate over all bit values in row-major order.
    #[inline]
    pub fn iter(&self) -> BitIter<'_> {
        BitIter {
            buffer: self,
            idx: 0,
        }
    }

    /// Iterate over the linear indices of set bits, skipping empty words.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, w)| **w != 0)
            .flat_map(|(word_idx, &word)| {
                let mut remaining = word;
                std::iter::from_fn(move || {
                    if remaining == 0 {
                        return None;
                    }
                    let bit = remaining.trailing_zeros() as usize;
                    remaining &= remaining - 1;
                    Some(word_idx * BITS_PER_WORD + bit)
                })
            })
    }

    fn clear_tail(&mut self) {
        let used = self.len % BITS_PER_WORD;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

/// Index by linear index.
impl Index<usize> for BitBuffer2 {
    type Output = bool;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        if self.get(idx) {
            &true
        } else {
            &false
        }
    }
}

/// Index by (x, y) coordinates.
impl Index<(usize, usize)> for BitBuffer2 {
    type Output = bool;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        if self.get_xy(x, y) {
            &true
        } else {
            &false
        }
    }
}

impl From<&BitBuffer2> for Vec<bool> {
    #[inline]
    fn from(buf: &BitBuffer2) -> Self {
        buf.iter().collect()
    }
}

/// Iterator over bit values.
pub struct BitIter<'a> {
    buffer: &'a BitBuffer2,
    idx: usize,
}

impl Iterator for BitIter<'_> {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx < self.buffer.len {
            let value = self.buffer.get(self.idx);
            self.idx += 1;
            Some(value)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len - self.idx;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BitIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_filled_true_counts_exactly() {
        // 10x7 = 70 bits, spans two words with a partial tail
        let buf = BitBuffer2::new_filled(10, 7, true);
        assert_eq!(buf.count_ones(), 70);
        assert!(buf.iter().all(|b| b));
    }

    #[test]
    fn test_new_default_is_clear() {
        let buf = BitBuffer2::new_default(9, 9);
        assert!(buf.is_all_clear());
        assert_eq!(buf.bounding_box(), None);
    }

    #[test]
    fn test_set_get_xy() {
        let mut buf = BitBuffer2::new_default(100, 3);
        buf.set_xy(99, 2, true);
        buf.set_xy(0, 1, true);
        assert!(buf.get_xy(99, 2));
        assert!(buf[(0, 1)]);
        assert!(!buf.get_xy(1, 1));
        buf.set_xy(99, 2, false);
        assert!(!buf.get_xy(99, 2));
    }

    #[test]
    fn test_from_slice_matches_from_fn() {
        let data: Vec<bool> = (0..(13 * 11)).map(|i| i % 3 == 0).collect();
        let a = BitBuffer2::from_slice(13, 11, &data);
        let b = BitBuffer2::from_fn(13, 11, |x, y| (y * 13 + x) % 3 == 0);
        assert_eq!(a, b);
        assert_eq!(Vec::<bool>::from(&a), data);
    }

    #[test]
    #[should_panic(expected = "does not match dimensions")]
    fn test_from_slice_wrong_length() {
        BitBuffer2::from_slice(4, 4, &[true; 15]);
    }

    #[test]
    fn test_and_or() {
        let a = BitBuffer2::from_fn(8, 8, |x, _| x < 4);
        let b = BitBuffer2::from_fn(8, 8, |_, y| y < 4);
        assert_eq!(a.and(&b).count_ones(), 16);
        assert_eq!(a.or(&b).count_ones(), 48);
    }

    #[test]
    fn test_bounding_box() {
        let buf = BitBuffer2::from_fn(70, 40, |x, y| (10..=20).contains(&x) && (5..=30).contains(&y));
        assert_eq!(buf.bounding_box(), Some((10, 5, 20, 30)));
    }

    #[test]
    fn test_iter_ones_matches_iter() {
        let buf = BitBuffer2::from_fn(67, 5, |x, y| (x * 7 + y) % 5 == 0);
        let expected: Vec<usize> = buf
            .iter()
            .enumerate()
            .filter(|(_, b)| *b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(buf.iter_ones().collect::<Vec<_>>(), expected);
    }
}
