use common::Buffer2;
use common::parallel::ParRowsMutAuto;
use rayon::prelude::*;

use super::saturate_u8;
use crate::image::Mask;

/// Pixel types that can be blended by bilinear interpolation.
pub trait Bilinear: Copy + Send + Sync {
    /// `a` and `b` are the top pair, `c` and `d` the bottom pair.
    fn blend(a: Self, b: Self, c: Self, d: Self, fx: f32, fy: f32) -> Self;
}

#[inline]
fn blend_f32(a: f32, b: f32, c: f32, d: f32, fx: f32, fy: f32) -> f32 {
    let top = a + (b - a) * fx;
    let bottom = c + (d - c) * fx;
    top + (bottom - top) * fy
}

impl Bilinear for f32 {
    #[inline]
    fn blend(a: f32, b: f32, c: f32, d: f32, fx: f32, fy: f32) -> f32 {
        blend_f32(a, b, c, d, fx, fy)
    }
}

impl Bilinear for u8 {
    #[inline]
    fn blend(a: u8, b: u8, c: u8, d: u8, fx: f32, fy: f32) -> u8 {
        saturate_u8(blend_f32(a as f32, b as f32, c as f32, d as f32, fx, fy))
    }
}

impl Bilinear for [u8; 3] {
    #[inline]
    fn blend(a: Self, b: Self, c: Self, d: Self, fx: f32, fy: f32) -> Self {
        std::array::from_fn(|ch| {
            saturate_u8(blend_f32(
                a[ch] as f32,
                b[ch] as f32,
                c[ch] as f32,
                d[ch] as f32,
                fx,
                fy,
            ))
        })
    }
}

/// Source sample positions for one axis using pixel-centre alignment.
/// Returns `(i0, i1, frac)` per destination index.
fn axis_taps(src_len: usize, dst_len: usize) -> Vec<(usize, usize, f32)> {
    let scale = src_len as f32 / dst_len as f32;
    (0..dst_len)
        .map(|i| {
            let s = ((i as f32 + 0.5) * scale - 0.5).max(0.0);
            let i0 = (s.floor() as usize).min(src_len - 1);
            let i1 = (i0 + 1).min(src_len - 1);
            (i0, i1, s - i0 as f32)
        })
        .collect()
}

/// Bilinear resize with half-pixel centres and replicated edges.
///
/// Resizing from or to an empty size yields an empty or zero-filled buffer.
pub fn resize_bilinear<T: Bilinear + Default>(
    src: &Buffer2<T>,
    width: usize,
    height: usize,
) -> Buffer2<T> {
    let mut dst = Buffer2::new_filled(width, height, T::default());
    if src.is_empty() || dst.is_empty() {
        return dst;
    }

    let x_taps = axis_taps(src.width(), width);
    let y_taps = axis_taps(src.height(), height);

    dst.pixels_mut()
        .par_rows_mut_auto(width)
        .for_each(|(y_start, chunk)| {
            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let (y0, y1, fy) = y_taps[y_start + local_y];
                let top = src.row(y0);
                let bottom = src.row(y1);
                for (out, &(x0, x1, fx)) in out_row.iter_mut().zip(&x_taps) {
                    *out = T::blend(top[x0], top[x1], bottom[x0], bottom[x1], fx, fy);
                }
            }
        });

    dst
}

/// Nearest-neighbour mask resize (`src = floor(dst * src_len / dst_len)`).
pub fn resize_nearest_mask(src: &Mask, width: usize, height: usize) -> Mask {
    if src.is_empty() {
        return Mask::new_default(width, height);
    }
    let (sw, sh) = src.dimensions();
    Mask::from_fn(width, height, |x, y| {
        let sx = (x * sw / width).min(sw - 1);
        let sy = (y * sh / height).min(sh - 1);
        src.get_xy(sx, sy)
    })
}
