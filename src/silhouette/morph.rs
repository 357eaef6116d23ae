use ndarray::Array2;

use super::types::Mask;

/// Morphological closing: one 3x3 dilation pass followed by one 3x3
/// erosion pass. Fills pinholes and notches along the subject boundary
/// without growing the overall silhouette.
pub fn close(mask: &Mask) -> Mask {
    erode(&dilate(mask))
}

/// 3x3 square dilation. Out-of-bounds neighbors do not contribute.
pub fn dilate(mask: &Mask) -> Mask {
    window_reduce(mask, 0, u8::max)
}

/// 3x3 square erosion. Out-of-bounds neighbors do not contribute.
pub fn erode(mask: &Mask) -> Mask {
    window_reduce(mask, 255, u8::min)
}

fn window_reduce(mask: &Mask, init: u8, fold: fn(u8, u8) -> u8) -> Mask {
    let (rows, cols) = mask.dim();
    let mut out = Array2::zeros((rows, cols));

    for row in 0..rows {
        for col in 0..cols {
            let mut value = init;
            for dr in row.saturating_sub(1)..(row + 2).min(rows) {
                for dc in col.saturating_sub(1)..(col + 2).min(cols) {
                    value = fold(value, mask[[dr, dc]]);
                }
            }
            out[[row, col]] = value;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn closing_fills_a_pinhole() {
        let mask = array![
            [255u8, 255, 255, 255, 255],
            [255, 255, 255, 255, 255],
            [255, 255, 0, 255, 255],
            [255, 255, 255, 255, 255],
            [255, 255, 255, 255, 255],
        ];
        let closed = close(&mask);
        assert!(closed.iter().all(|&v| v == 255));
    }

    #[test]
    fn closing_does_not_grow_a_solid_block() {
        // 0-border around a solid 3x3 block: dilation reaches one pixel
        // out, erosion pulls it back.
        let mut mask = Array2::zeros((7, 7));
        for row in 2..5 {
            for col in 2..5 {
                mask[[row, col]] = 255;
            }
        }
        assert_eq!(close(&mask), mask);
    }

    #[test]
    fn closing_is_idempotent_on_a_noise_free_mask() {
        let mut mask = Array2::zeros((9, 9));
        for row in 2..7 {
            for col in 3..8 {
                mask[[row, col]] = 255;
            }
        }
        let once = close(&mask);
        let twice = close(&once);
        assert_eq!(once, twice);
    }
}
