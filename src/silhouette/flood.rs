use image::RgbaImage;
use ndarray::Array2;

use super::types::{Mask, Tolerance};

/// Grow the connected background region from the top-left corner.
///
/// Floating-range region growing over the RGB projection of the source:
/// a 4-connected neighbor joins the region when each of its channels lies
/// within the per-channel tolerance of the pixel that discovered it, so
/// the region can drift across a gently shaded backdrop.
///
/// Returns a 0/255 mask where 255 marks pixels connected to the corner.
/// Background-colored pockets enclosed by the subject stay unmarked.
pub fn background_mask(source: &RgbaImage, tolerance: Tolerance) -> Mask {
    let (width, height) = source.dimensions();
    let mut mask = Array2::zeros((height as usize, width as usize));
    if width == 0 || height == 0 {
        return mask;
    }

    let tol = [
        tolerance.r as i16,
        tolerance.g as i16,
        tolerance.b as i16,
    ];

    let mut frontier = vec![(0u32, 0u32)];
    mask[[0, 0]] = 255;

    while let Some((x, y)) = frontier.pop() {
        let here = source.get_pixel(x, y);

        let mut visit = |nx: u32, ny: u32| {
            if mask[[ny as usize, nx as usize]] != 0 {
                return;
            }
            let there = source.get_pixel(nx, ny);
            let within = (0..3).all(|c| {
                (there.0[c] as i16 - here.0[c] as i16).abs() <= tol[c]
            });
            if within {
                mask[[ny as usize, nx as usize]] = 255;
                frontier.push((nx, ny));
            }
        };

        if x > 0 {
            visit(x - 1, y);
        }
        if x + 1 < width {
            visit(x + 1, y);
        }
        if y > 0 {
            visit(x, y - 1);
        }
        if y + 1 < height {
            visit(x, y + 1);
        }
    }

    mask
}
