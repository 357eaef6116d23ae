use ndarray::Array2;

use super::types::{Coverage, Mask};

/// Separable 5x5 binomial kernel, the fixed small-kernel equivalent of a
/// Gaussian at this size.
const KERNEL: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
const KERNEL_SUM: f32 = 16.0;

/// Smooth a 0/255 mask into continuous coverage in [0, 1].
///
/// Runs the kernel horizontally then vertically, clamping reads at the
/// image border, then normalizes out of the 0..255 range. The hard
/// dilate/erode boundary comes out as a 1-2 pixel feathered band.
pub fn feather(mask: &Mask) -> Coverage {
    let (rows, cols) = mask.dim();
    if rows == 0 || cols == 0 {
        return Array2::zeros((rows, cols));
    }

    let mut horizontal = Array2::zeros((rows, cols));
    for row in 0..rows {
        for col in 0..cols {
            let mut acc = 0.0f32;
            for (k, weight) in KERNEL.iter().enumerate() {
                let src = (col as isize + k as isize - 2).clamp(0, cols as isize - 1);
                acc += weight * mask[[row, src as usize]] as f32;
            }
            horizontal[[row, col]] = acc / KERNEL_SUM;
        }
    }

    let mut coverage = Array2::zeros((rows, cols));
    for row in 0..rows {
        for col in 0..cols {
            let mut acc = 0.0f32;
            for (k, weight) in KERNEL.iter().enumerate() {
                let src = (row as isize + k as isize - 2).clamp(0, rows as isize - 1);
                acc += weight * horizontal[[src as usize, col]];
            }
            coverage[[row, col]] = acc / (KERNEL_SUM * 255.0);
        }
    }

    coverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn kernel_is_normalized() {
        assert_eq!(KERNEL.iter().sum::<f32>(), KERNEL_SUM);
    }

    #[test]
    fn uniform_mask_stays_uniform() {
        let full = Array2::from_elem((8, 8), 255u8);
        let coverage = feather(&full);
        assert!(coverage.iter().all(|&v| (v - 1.0).abs() < 1e-5));

        let empty = Array2::zeros((8, 8));
        let coverage = feather(&empty);
        assert!(coverage.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn coverage_stays_in_unit_range() {
        // Checkerboard: worst case for over/undershoot.
        let mask = Array2::from_shape_fn((9, 9), |(r, c)| if (r + c) % 2 == 0 { 255u8 } else { 0 });
        let coverage = feather(&mask);
        assert!(coverage.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn edge_band_is_feathered() {
        // Half-filled mask: the step edge must become a monotonic ramp
        // wider than one pixel.
        let mask = Array2::from_shape_fn((8, 8), |(_, c)| if c < 4 { 255u8 } else { 0 });
        let coverage = feather(&mask);
        let ramp: Vec<f32> = (0..8).map(|c| coverage[[4, c]]).collect();
        assert!(ramp[0] > 0.99);
        assert!(ramp[7] < 0.01);
        assert!(ramp.windows(2).all(|w| w[0] >= w[1]));
        let partial = ramp.iter().filter(|&&v| v > 0.01 && v < 0.99).count();
        assert!(partial >= 2, "expected a multi-pixel transition band, got {partial}");
    }
}
