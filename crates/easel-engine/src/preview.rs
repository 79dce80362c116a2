//! Headless preview compositing.
//!
//! Renders the object stack to an RGBA buffer: cached bitmaps for
//! image-bearing objects, solid fill boxes for text and shapes. The
//! mask layer defines clipping rather than visible ink, so it is not
//! composited. Rotation is not applied; the preview is a placement
//! check, not a print proof.

use std::collections::HashMap;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use easel_canvas::{ObjectContent, RenderSurface};

/// Parse a `#rrggbb` color, falling back to opaque black.
fn parse_color(hex: &str) -> Rgba<u8> {
    let parsed = hex.strip_prefix('#').and_then(|digits| {
        if digits.len() != 6 {
            return None;
        }
        let red = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let green = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let blue = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Rgba([red, green, blue, 255]))
    });
    parsed.unwrap_or(Rgba([0, 0, 0, 255]))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_dimensions(width: f64, height: f64) -> Option<(u32, u32)> {
    if width < 1.0 || height < 1.0 {
        return None;
    }
    Some((width.round() as u32, height.round() as u32))
}

#[allow(clippy::cast_possible_truncation)]
fn apply_opacity(image: &mut RgbaImage, opacity: f64) {
    if opacity >= 1.0 {
        return;
    }
    let opacity = opacity.clamp(0.0, 1.0);
    for pixel in image.pixels_mut() {
        pixel.0[3] = (f64::from(pixel.0[3]) * opacity).round() as u8;
    }
}

#[allow(clippy::cast_possible_truncation)]
fn top_left(center: (f64, f64), size: (u32, u32)) -> (i64, i64) {
    (
        (center.0 - f64::from(size.0) / 2.0).round() as i64,
        (center.1 - f64::from(size.1) / 2.0).round() as i64,
    )
}

/// Composite the surface's object stack, bottom to top.
#[must_use]
pub fn render<S: RenderSurface + ?Sized>(
    surface: &S,
    bitmaps: &HashMap<String, RgbaImage>,
) -> RgbaImage {
    let (width, height) = surface.dimensions();
    let mut canvas = RgbaImage::new(width, height);
    for object in surface.objects() {
        let (scaled_w, scaled_h) = object.scaled_size();
        let Some(size) = scaled_dimensions(scaled_w, scaled_h) else {
            continue;
        };
        let placement = object.placement;
        let mut layer = match &object.content {
            ObjectContent::Mask(_) => continue,
            ObjectContent::Background(source) | ObjectContent::Image(source) => {
                let Some(bitmap) = bitmaps.get(&source.id) else {
                    continue;
                };
                imageops::resize(bitmap, size.0, size.1, FilterType::Triangle)
            }
            ObjectContent::Text { style, .. } => {
                RgbaImage::from_pixel(size.0, size.1, parse_color(&style.color))
            }
            ObjectContent::Shape { fill, .. } => {
                RgbaImage::from_pixel(size.0, size.1, parse_color(fill))
            }
        };
        apply_opacity(&mut layer, placement.opacity);
        let (left, top) = top_left((placement.x, placement.y), size);
        imageops::overlay(&mut canvas, &layer, left, top);
    }
    canvas
}
