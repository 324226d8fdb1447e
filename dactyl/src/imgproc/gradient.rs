use common::Buffer2;

use super::reflect101;

/// Horizontal and vertical image derivatives.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub gx: Buffer2<f32>,
    pub gy: Buffer2<f32>,
}

/// 3×3 Sobel derivatives with reflect-101 borders.
///
/// `gx` responds to intensity increasing to the right, `gy` to intensity
/// increasing downwards.
pub fn sobel(img: &Buffer2<f32>) -> Gradients {
    let (width, height) = img.dimensions();
    let mut gx = Buffer2::new_default(width, height);
    let mut gy = Buffer2::new_default(width, height);
    if img.is_empty() {
        return Gradients { gx, gy };
    }

    for y in 0..height {
        let up = img.row(reflect101(y as isize - 1, height));
        let mid = img.row(y);
        let down = img.row(reflect101(y as isize + 1, height));
        for x in 0..width {
            let l = reflect101(x as isize - 1, width);
            let r = reflect101(x as isize + 1, width);

            let dx = (up[r] - up[l]) + 2.0 * (mid[r] - mid[l]) + (down[r] - down[l]);
            let dy = (down[l] - up[l]) + 2.0 * (down[x] - up[x]) + (down[r] - up[r]);

            gx[(x, y)] = dx;
            gy[(x, y)] = dy;
        }
    }

    Gradients { gx, gy }
}
