//! Printable-region geometry derived from a mask's pixels.
//!
//! Product photos ship with an alpha mask whose opaque pixels mark the
//! printable area. [`resolve_clip_bounds`] scans the mask once, finds
//! the opaque bounding box in mask pixel space, and maps it into canvas
//! space using the scale and centering the mask is rendered with. The
//! result drives both clipping and the default placement of new
//! objects.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned printable region in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipBounds {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Region width.
    pub width: f64,
    /// Region height.
    pub height: f64,
}

impl ClipBounds {
    /// A region covering the whole canvas.
    #[must_use]
    pub const fn full_canvas(canvas: (f64, f64)) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: canvas.0,
            height: canvas.1,
        }
    }

    /// Center point of the region.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            self.left + self.width / 2.0,
            self.top + self.height / 2.0,
        )
    }
}

/// Compute the printable region from a mask's opaque bounding box.
///
/// A pixel is opaque when its alpha or red channel exceeds
/// `opaque_threshold` (the red fallback covers masks exported without
/// an alpha channel). The mask is assumed rendered at
/// `min(rendered_w / natural_w, rendered_h / natural_h)` uniform scale,
/// centered on the canvas. Returns `None` when the mask has no opaque
/// pixel; callers fall back to the full canvas.
#[must_use]
pub fn resolve_clip_bounds(
    mask: &RgbaImage,
    rendered_size: (f64, f64),
    canvas_size: (f64, f64),
    opaque_threshold: u8,
) -> Option<ClipBounds> {
    let (natural_w, natural_h) = mask.dimensions();
    if natural_w == 0 || natural_h == 0 {
        return None;
    }

    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;
    for (x, y, pixel) in mask.enumerate_pixels() {
        let [red, _, _, alpha] = pixel.0;
        if alpha > opaque_threshold || red > opaque_threshold {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if !found {
        return None;
    }

    let scale = (rendered_size.0 / f64::from(natural_w))
        .min(rendered_size.1 / f64::from(natural_h));
    let scaled_w = f64::from(natural_w) * scale;
    let scaled_h = f64::from(natural_h) * scale;
    let offset_x = (canvas_size.0 - scaled_w) / 2.0;
    let offset_y = (canvas_size.1 - scaled_h) / 2.0;

    let left = offset_x + f64::from(min_x) * scale;
    let top = offset_y + f64::from(min_y) * scale;
    let width = f64::from(max_x - min_x + 1) * scale;
    let height = f64::from(max_y - min_y + 1) * scale;

    // Keep the region inside the canvas even for masks that overhang.
    let left = left.max(0.0);
    let top = top.max(0.0);
    let width = width.min(canvas_size.0 - left);
    let height = height.min(canvas_size.1 - top);

    Some(ClipBounds {
        left,
        top,
        width,
        height,
    })
}
