use ndarray::Array2;

/// Binary region mask: 0 = outside, 255 = inside.
/// Indexed `[row, column]`; dimensions match the source image.
pub type Mask = Array2<u8>;

/// Per-pixel foreground coverage: 0.0 = background, 1.0 = foreground.
/// After smoothing, intermediate values represent feathered edge coverage.
/// Dimensions match the source image.
pub type Coverage = Array2<f32>;

/// Per-channel tolerance for the background region growing.
///
/// A neighboring pixel joins the region when each of its channels lies
/// within the tolerance of the pixel that discovered it. The green
/// tolerance is kept tighter than red and blue so the fill does not bleed
/// into subjects that differ from the backdrop mainly in green.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { r: 10, g: 5, b: 10 }
    }
}
