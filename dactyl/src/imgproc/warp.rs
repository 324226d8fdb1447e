use common::Buffer2;
use common::parallel::ParRowsMutAuto;
use glam::{DAffine2, DVec2};
use rayon::prelude::*;

use super::Bilinear;

/// Rotation by `degrees` about `center`. Positive angles turn the image
/// counter-clockwise as displayed (y axis pointing down).
pub fn rotation_about(center: DVec2, degrees: f64) -> DAffine2 {
    DAffine2::from_translation(center)
        * DAffine2::from_angle(-degrees.to_radians())
        * DAffine2::from_translation(-center)
}

/// Resample `src` through the forward transform `transform` into a
/// `width × height` output.
///
/// Each output pixel is pulled from `transform⁻¹(x, y)` with bilinear
/// interpolation; neighbours outside the source read as zero.
pub fn warp_affine<T: Bilinear + Default>(
    src: &Buffer2<T>,
    transform: &DAffine2,
    width: usize,
    height: usize,
) -> Buffer2<T> {
    let mut dst = Buffer2::new_filled(width, height, T::default());
    if src.is_empty() || dst.is_empty() {
        return dst;
    }
    let inverse = transform.inverse();
    let (sw, sh) = (src.width() as isize, src.height() as isize);
    let fetch = |x: isize, y: isize| -> T {
        if x >= 0 && y >= 0 && x < sw && y < sh {
            src[(x as usize, y as usize)]
        } else {
            T::default()
        }
    };

    dst.pixels_mut()
        .par_rows_mut_auto(width)
        .for_each(|(y_start, chunk)| {
            for (local_y, out_row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = (y_start + local_y) as f64;
                for (x, out) in out_row.iter_mut().enumerate() {
                    let p = inverse.transform_point2(DVec2::new(x as f64, y));
                    let (x0, y0) = (p.x.floor(), p.y.floor());
                    let (ix, iy) = (x0 as isize, y0 as isize);
                    if ix < -1 || iy < -1 || ix >= sw || iy >= sh {
                        continue;
                    }
                    let fx = (p.x - x0) as f32;
                    let fy = (p.y - y0) as f32;
                    *out = T::blend(
                        fetch(ix, iy),
                        fetch(ix + 1, iy),
                        fetch(ix, iy + 1),
                        fetch(ix + 1, iy + 1),
                        fx,
                        fy,
                    );
                }
            }
        });

    dst
}
