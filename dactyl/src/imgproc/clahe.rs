//! Contrast-limited adaptive histogram equalisation.

use common::Buffer2;
use common::parallel::ParRowsMutAuto;
use rayon::prelude::*;

use super::{reflect101, saturate_u8};
use crate::image::GrayImage;

const BINS: usize = 256;

/// CLAHE over a `tiles_x × tiles_y` grid.
///
/// Frames that do not divide evenly into tiles are extended with reflected
/// borders for the histogram pass. Each tile histogram is clipped at
/// `clip_limit * tile_area / 256` (at least 1) with the excess spread evenly
/// over all bins; output pixels blend the four nearest tile mappings
/// bilinearly.
pub fn clahe(img: &GrayImage, tiles_x: usize, tiles_y: usize, clip_limit: f64) -> GrayImage {
    assert!(tiles_x > 0 && tiles_y > 0, "CLAHE tile grid must be non-empty");
    let (width, height) = img.dimensions();
    if img.is_empty() {
        return img.clone();
    }

    let tile_w = width.div_ceil(tiles_x);
    let tile_h = height.div_ceil(tiles_y);
    let tile_area = tile_w * tile_h;

    let clip = if clip_limit > 0.0 {
        ((clip_limit * tile_area as f64 / BINS as f64) as usize).max(1)
    } else {
        usize::MAX
    };
    let lut_scale = (BINS - 1) as f32 / tile_area as f32;

    let luts: Vec<[u8; BINS]> = (0..tiles_x * tiles_y)
        .into_par_iter()
        .map(|tile| {
            let tx = tile % tiles_x;
            let ty = tile / tiles_x;
            let mut hist = [0usize; BINS];
            for py in ty * tile_h..(ty + 1) * tile_h {
                let row = img.row(reflect101(py as isize, height));
                for px in tx * tile_w..(tx + 1) * tile_w {
                    hist[row[reflect101(px as isize, width)] as usize] += 1;
                }
            }
            clip_histogram(&mut hist, clip);

            let mut lut = [0u8; BINS];
            let mut cumulative = 0usize;
            for (bin, out) in lut.iter_mut().enumerate() {
                cumulative += hist[bin];
                *out = saturate_u8(cumulative as f32 * lut_scale);
            }
            lut
        })
        .collect();

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;

    let mut output: GrayImage = Buffer2::new_default(width, height);
    output
        .pixels_mut()
        .par_rows_mut_auto(width)
        .for_each(|(y_start, chunk)| {
            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = y_start + local_y;
                let (ty1, ty2, fy) = tile_neighbours(y, inv_th, tiles_y);
                let src_row = img.row(y);
                for (x, out) in out_row.iter_mut().enumerate() {
                    let (tx1, tx2, fx) = tile_neighbours(x, inv_tw, tiles_x);
                    let v = src_row[x] as usize;
                    let top = luts[ty1 * tiles_x + tx1][v] as f32 * (1.0 - fx)
                        + luts[ty1 * tiles_x + tx2][v] as f32 * fx;
                    let bottom = luts[ty2 * tiles_x + tx1][v] as f32 * (1.0 - fx)
                        + luts[ty2 * tiles_x + tx2][v] as f32 * fx;
                    *out = saturate_u8(top * (1.0 - fy) + bottom * fy);
                }
            }
        });

    output
}

fn clip_histogram(hist: &mut [usize; BINS], clip: usize) {
    let mut excess = 0usize;
    for count in hist.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }
    if excess == 0 {
        return;
    }

    let batch = excess / BINS;
    let mut residual = excess - batch * BINS;
    for count in hist.iter_mut() {
        *count += batch;
    }
    if residual > 0 {
        let step = (BINS / residual).max(1);
        let mut bin = 0;
        while bin < BINS && residual > 0 {
            hist[bin] += 1;
            residual -= 1;
            bin += step;
        }
    }
}

/// Two nearest tile indices along one axis and the blend weight of the second.
#[inline]
fn tile_neighbours(pos: usize, inv_tile: f32, tiles: usize) -> (usize, usize, f32) {
    let t = pos as f32 * inv_tile - 0.5;
    let t1 = t.floor();
    let frac = t - t1;
    let t1 = t1 as isize;
    let lo = t1.max(0) as usize;
    let hi = ((t1 + 1) as usize).min(tiles - 1);
    (lo.min(tiles - 1), hi, frac)
}
