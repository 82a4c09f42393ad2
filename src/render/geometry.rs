//! Shared geometry for overlays
//!
//! Bounds computed here are used both by the renderer and by gesture hit
//! testing, so what the user grabs is exactly what is drawn.

use crate::domain::{Point, Rect, SignatureOverlay, TextOverlay, ViewTransform};

use super::text::TextFont;

/// Text layout constants
pub mod text {
    /// Advance per character, in ems, used when no font is loaded
    pub const FALLBACK_ADVANCE: f32 = 0.6;
}

/// Stage backdrop behind the document on the display surface (RGBA)
pub const BACKDROP: [u8; 4] = [0xe2, 0xe8, 0xf0, 0xff];

/// Device transform for drawing document coordinates onto a surface
///
/// `surface_scale` is the extra resolution factor of the target surface:
/// 1 for the display, the oversample factor for exports.
pub fn device_transform(view: &ViewTransform, surface_scale: f32) -> tiny_skia::Transform {
    tiny_skia::Transform::from_row(
        view.zoom * surface_scale,
        0.0,
        0.0,
        view.zoom * surface_scale,
        view.pan.x * surface_scale,
        view.pan.y * surface_scale,
    )
}

/// Map a document point to device pixels on a surface
pub fn document_to_device(p: Point, view: &ViewTransform, surface_scale: f32) -> Point {
    (p * view.zoom + view.pan) * surface_scale
}

/// Font size in document pixels for a text overlay
pub fn text_font_size(overlay: &TextOverlay, base_font_size: f32) -> f32 {
    base_font_size * overlay.scale
}

/// Text box in document coordinates
pub fn text_bounds(overlay: &TextOverlay, font: &TextFont, base_font_size: f32) -> Rect {
    let (w, h) = font.measure(&overlay.content, text_font_size(overlay, base_font_size));
    Rect::from_origin_size(overlay.position, w, h)
}

/// Signature box in document coordinates
pub fn signature_bounds(overlay: &SignatureOverlay<'_>) -> Rect {
    let (w, h) = overlay.extent();
    Rect::from_origin_size(overlay.position, w, h)
}
