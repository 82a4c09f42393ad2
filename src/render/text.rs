//! Text measurement and glyph rasterization using ab_glyph
//!
//! Text is laid out top-left anchored: the first baseline sits one ascent
//! below the anchor, following lines advance by the font's line height.
//! Glyphs are rasterized directly at device resolution so text stays crisp at
//! any zoom and in the oversampled export.

use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontArc, GlyphId, OutlinedGlyph, PxScale, ScaleFont};
use tiny_skia::{IntSize, Pixmap};

use super::geometry::text::FALLBACK_ADVANCE;
use crate::domain::Point;

/// Well-known locations of a plain sans-serif font
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font used for the text overlay.
///
/// May be empty when no font could be found; text is then measured with a
/// fixed per-character estimate and not drawn.
#[derive(Clone, Default)]
pub struct TextFont {
    font: Option<FontArc>,
}

impl std::fmt::Debug for TextFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextFont")
            .field("available", &self.is_available())
            .finish()
    }
}

/// Glyph coverage for one piece of text, positioned in device pixels
pub struct GlyphRaster {
    pub pixmap: Pixmap,
    pub left: i32,
    pub top: i32,
}

impl TextFont {
    /// A font handle without glyphs
    pub fn none() -> Self {
        Self::default()
    }

    /// Load `preferred` if given, otherwise the first system font found
    pub fn load(preferred: Option<&Path>) -> Self {
        let candidates = preferred
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            match FontArc::try_from_vec(bytes) {
                Ok(font) => {
                    log::info!("Using font {}", path.display());
                    return Self { font: Some(font) };
                }
                Err(err) => log::warn!("Ignoring unreadable font {}: {}", path.display(), err),
            }
        }

        log::warn!("No usable font found; text overlays will not be drawn");
        Self::none()
    }

    /// Parse a font from raw TrueType/OpenType bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        FontArc::try_from_vec(bytes)
            .ok()
            .map(|font| Self { font: Some(font) })
    }

    pub fn is_available(&self) -> bool {
        self.font.is_some()
    }

    /// Width and height of the laid out text box at `font_size` pixels
    pub fn measure(&self, text: &str, font_size: f32) -> (f32, f32) {
        if text.is_empty() {
            return (0.0, 0.0);
        }
        let lines = text.split('\n');
        let Some(font) = &self.font else {
            let mut count = 0usize;
            let widest = lines
                .inspect(|_| count += 1)
                .map(|line| line.chars().count())
                .max()
                .unwrap_or(0);
            return (
                widest as f32 * font_size * FALLBACK_ADVANCE,
                count as f32 * font_size,
            );
        };

        let scaled = font.as_scaled(PxScale::from(font_size));
        let mut count = 0usize;
        let widest = lines
            .inspect(|_| count += 1)
            .map(|line| line_advance(font, line, font_size))
            .fold(0.0f32, f32::max);
        (widest, count as f32 * scaled.height())
    }

    /// Rasterize `text` with its top-left corner at `origin` (device pixels).
    ///
    /// Only the part inside a `surface`-sized target starting at (0,0) is
    /// rasterized. Returns `None` when there is nothing to draw there.
    pub fn rasterize(
        &self,
        text: &str,
        font_size: f32,
        color: [u8; 4],
        origin: Point,
        surface: IntSize,
    ) -> Option<GlyphRaster> {
        let font = self.font.as_ref()?;
        if text.is_empty() || !(font_size.is_finite() && font_size > 0.0) {
            return None;
        }

        let surface_w = surface.width() as f32;
        let surface_h = surface.height() as f32;
        let glyphs: Vec<OutlinedGlyph> = outline_text(font, text, font_size, origin)
            .into_iter()
            .filter(|glyph| {
                let b = glyph.px_bounds();
                b.max.x > 0.0 && b.max.y > 0.0 && b.min.x < surface_w && b.min.y < surface_h
            })
            .collect();
        if glyphs.is_empty() {
            return None;
        }

        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for glyph in &glyphs {
            let b = glyph.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
        }

        // Clip the box to the surface
        let left = (min_x.floor() as i64).max(0) as i32;
        let top = (min_y.floor() as i64).max(0) as i32;
        let right = (max_x.ceil() as i64).min(surface.width() as i64) as i32;
        let bottom = (max_y.ceil() as i64).min(surface.height() as i64) as i32;
        let width = (right - left).max(0) as u32;
        let height = (bottom - top).max(0) as u32;
        let size = IntSize::from_wh(width, height)?;

        let mut coverage = vec![0.0f32; width as usize * height as usize];
        for glyph in &glyphs {
            let b = glyph.px_bounds();
            let gx0 = b.min.x.floor() as i64 - left as i64;
            let gy0 = b.min.y.floor() as i64 - top as i64;
            glyph.draw(|x, y, cov| {
                let px = gx0 + x as i64;
                let py = gy0 + y as i64;
                if px >= 0 && py >= 0 && (px as u64) < width as u64 && (py as u64) < height as u64 {
                    let idx = py as usize * width as usize + px as usize;
                    coverage[idx] = (coverage[idx] + cov).min(1.0);
                }
            });
        }

        let [r, g, b, a] = color;
        let mut data = Vec::with_capacity(coverage.len() * 4);
        for cov in coverage {
            let alpha = (a as f32 * cov).round() as u8;
            data.extend_from_slice(&[
                premultiply(r, alpha),
                premultiply(g, alpha),
                premultiply(b, alpha),
                alpha,
            ]);
        }

        let pixmap = Pixmap::from_vec(data, size)?;
        Some(GlyphRaster { pixmap, left, top })
    }
}

fn line_advance(font: &FontArc, line: &str, font_size: f32) -> f32 {
    let scaled = font.as_scaled(PxScale::from(font_size));
    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in line.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

fn outline_text(font: &FontArc, text: &str, font_size: f32, origin: Point) -> Vec<OutlinedGlyph> {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();
    let line_height = scaled.height();

    let mut glyphs = Vec::new();
    for (line_idx, line) in text.split('\n').enumerate() {
        let baseline = origin.y + ascent + line_idx as f32 * line_height;
        let mut cursor_x = origin.x;
        let mut prev: Option<GlyphId> = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = prev {
                cursor_x += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(cursor_x, baseline));
            cursor_x += scaled.h_advance(id);
            prev = Some(id);
            if let Some(outlined) = font.outline_glyph(glyph) {
                glyphs.push(outlined);
            }
        }
    }
    glyphs
}

#[inline]
fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((channel as u16 * alpha as u16 + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> IntSize {
        IntSize::from_wh(900, 700).unwrap()
    }

    #[test]
    fn test_fallback_measure_without_font() {
        let font = TextFont::none();
        assert!(!font.is_available());
        assert_eq!(font.measure("", 24.0), (0.0, 0.0));
        let (w, h) = font.measure("Hello", 24.0);
        assert!((w - 5.0 * 24.0 * FALLBACK_ADVANCE).abs() < 1e-4);
        assert_eq!(h, 24.0);
        let (_, h) = font.measure("two\nlines", 10.0);
        assert_eq!(h, 20.0);
    }

    #[test]
    fn test_no_font_draws_nothing() {
        let font = TextFont::none();
        assert!(font.rasterize("Hello", 24.0, [0, 0, 0, 255], Point::ORIGIN, surface()).is_none());
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(TextFont::from_bytes(b"not a font".to_vec()).is_none());
    }

    #[test]
    fn test_system_font_rasterizes_near_origin() {
        // Skips on machines without any of the candidate fonts
        let font = TextFont::load(None);
        if !font.is_available() {
            return;
        }
        let origin = Point::new(50.0, 50.0);
        let raster = font
            .rasterize("Hello", 24.0, [0, 0, 0, 255], origin, surface())
            .expect("glyphs for Hello");
        assert!(raster.left >= 48 && raster.left <= 56, "left {}", raster.left);
        assert!(raster.top >= 48 && raster.top <= 62, "top {}", raster.top);

        let (w, h) = font.measure("Hello", 24.0);
        assert!(w > 24.0 && w < 120.0);
        assert!((h - 24.0).abs() < 6.0);

        let (w2, _) = font.measure("Hello", 48.0);
        assert!((w2 - 2.0 * w).abs() < 1.0);
    }

    #[test]
    fn test_rasterize_is_clipped_to_surface() {
        let font = TextFont::load(None);
        if !font.is_available() {
            return;
        }
        let long = "W".repeat(300);
        let font_px = 24.0 * 5.0 * 4.0;
        let black = [0, 0, 0, 255];

        // Far off to the left, right, and below: nothing to rasterize
        for origin in [
            Point::new(-200_000.0, 0.0),
            Point::new(5_000.0, 0.0),
            Point::new(0.0, 10_000.0),
        ] {
            assert!(font.rasterize(&long, font_px, black, origin, surface()).is_none());
        }

        // Straddling the surface: only the visible part is allocated
        let raster = font
            .rasterize(&long, font_px, black, Point::new(-20_000.0, -30.0), surface())
            .expect("glyphs cross the surface");
        assert!(raster.left >= 0 && raster.top >= 0);
        assert!(raster.pixmap.width() <= 900, "width {}", raster.pixmap.width());
        assert!(raster.pixmap.height() <= 700, "height {}", raster.pixmap.height());
        assert!(raster.pixmap.pixels().iter().any(|p| p.alpha() > 0));
    }

    #[test]
    fn test_premultiply() {
        assert_eq!(premultiply(255, 255), 255);
        assert_eq!(premultiply(200, 0), 0);
        assert_eq!(premultiply(255, 128), 128);
    }
}
