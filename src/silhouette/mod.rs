mod blur;
mod flood;
mod morph;
mod types;

pub use types::{Coverage, Mask, Tolerance};

use image::{Rgba, RgbaImage};

/// Canvas color the silhouette is composited over: opaque white.
const CANVAS: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Fill color of the silhouette itself: opaque black.
const SILHOUETTE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Turns a sprite with an arbitrary backdrop into a soft-edged solid
/// silhouette over a blank canvas.
///
/// The backdrop color is never passed in: it is whatever region is
/// connected to the top-left corner pixel within the growing tolerance.
/// If the corner happens to land on the subject, the result is a visually
/// wrong silhouette, not an error.
pub struct SilhouetteRenderer {
    tolerance: Tolerance,
}

impl SilhouetteRenderer {
    pub fn new() -> Self {
        Self {
            tolerance: Tolerance::default(),
        }
    }

    /// Render a silhouette the same size as the source.
    ///
    /// Pipeline: corner-seeded flood fill -> invert -> 3x3 close ->
    /// 5x5 feathering blur -> two-color composite.
    pub fn render(&self, source: &RgbaImage) -> RgbaImage {
        let coverage = self.coverage(source);
        composite(&coverage)
    }

    /// Smoothed foreground coverage for the source, in [0, 1].
    pub fn coverage(&self, source: &RgbaImage) -> Coverage {
        let _span = tracing::debug_span!("silhouette").entered();

        let background = flood::background_mask(source, self.tolerance);
        let foreground = background.mapv(|v| 255 - v);
        let closed = morph::close(&foreground);
        blur::feather(&closed)
    }

    /// Closed foreground mask before any feathering, 0/255.
    #[cfg(test)]
    fn closed_mask(&self, source: &RgbaImage) -> Mask {
        let background = flood::background_mask(source, self.tolerance);
        morph::close(&background.mapv(|v| 255 - v))
    }
}

impl Default for SilhouetteRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Blend canvas and silhouette colors by coverage, every channel alpha
/// included. Interpolating alpha like a color channel is not true
/// compositing, but it is the committed output contract.
fn composite(coverage: &Coverage) -> RgbaImage {
    let (rows, cols) = coverage.dim();
    let mut out = RgbaImage::new(cols as u32, rows as u32);

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let m = coverage[[y as usize, x as usize]];
        for c in 0..4 {
            pixel.0[c] = (CANVAS.0[c] as f32 * (1.0 - m) + SILHOUETTE.0[c] as f32 * m) as u8;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x4 red square centered in a 2-pixel white border.
    fn red_square_on_white() -> RgbaImage {
        RgbaImage::from_fn(8, 8, |x, y| {
            if (2..6).contains(&x) && (2..6).contains(&y) {
                Rgba([220, 40, 40, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn output_dimensions_match_source() {
        let renderer = SilhouetteRenderer::new();
        for (w, h) in [(1, 1), (3, 7), (8, 8), (40, 25)] {
            let src = RgbaImage::from_pixel(w, h, Rgba([12, 200, 99, 255]));
            let out = renderer.render(&src);
            assert_eq!(out.dimensions(), (w, h));
        }
    }

    #[test]
    fn uniform_source_renders_as_canvas() {
        let renderer = SilhouetteRenderer::new();
        let src = RgbaImage::from_pixel(10, 10, Rgba([90, 90, 90, 255]));
        let out = renderer.render(&src);
        for pixel in out.pixels() {
            assert_eq!(*pixel, Rgba([255, 255, 255, 255]));
        }
    }

    #[test]
    fn coverage_is_always_in_unit_range() {
        let renderer = SilhouetteRenderer::new();
        let coverage = renderer.coverage(&red_square_on_white());
        assert!(coverage.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn second_close_pass_changes_nothing() {
        // The closed mask of a clean subject has no 1-pixel noise left,
        // so closing it again is exact.
        let renderer = SilhouetteRenderer::new();
        let once = renderer.closed_mask(&red_square_on_white());
        let again = morph::close(&once);
        assert_eq!(once, again);
    }

    #[test]
    fn red_square_becomes_black_core_with_feathered_edge() {
        let renderer = SilhouetteRenderer::new();
        let out = renderer.render(&red_square_on_white());

        // Far corners stay canvas white.
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(7, 7), Rgba([255, 255, 255, 255]));

        // The square core blends strongly toward silhouette black. The
        // feathering kernel is wider than half the square, so even the
        // center keeps a small canvas contribution.
        let center = out.get_pixel(4, 4);
        assert!(center.0[0] < 40 && center.0[1] < 40 && center.0[2] < 40);

        // The boundary row holds at least one partially blended pixel.
        let band: Vec<u8> = (0..8).map(|x| out.get_pixel(x, 3).0[0]).collect();
        assert!(
            band.iter().any(|&v| v > 20 && v < 235),
            "expected a gradient band across the edge, got {band:?}"
        );
    }

    #[test]
    fn alpha_follows_the_same_interpolation() {
        // Canvas and silhouette are both opaque, so the blended alpha
        // stays opaque everywhere, up to float truncation in the blend.
        let renderer = SilhouetteRenderer::new();
        let out = renderer.render(&red_square_on_white());
        assert!(out.pixels().all(|p| p.0[3] >= 254));
    }
}
