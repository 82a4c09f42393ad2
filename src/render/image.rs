//! Scene rendering using tiny-skia
//!
//! One draw routine serves both the interactive display and the export: the
//! caller picks the view transform and the surface scale. Layers are always
//! drawn background, text, signature.

use image::RgbaImage;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, PremultipliedColorU8, Transform};

use super::geometry::{self, document_to_device, text_font_size};
use super::text::TextFont;
use crate::domain::{Raster, Rect, SignatureOverlay, TextOverlay, ViewTransform};

/// Styling for the text layer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in document pixels at text scale 1.0
    pub base_font_size: f32,
    pub color: [u8; 4],
}

/// Everything one frame draws, borrowed from the editor state
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub background: Option<&'a Raster>,
    pub text: Option<&'a TextOverlay>,
    pub signature: Option<SignatureOverlay<'a>>,
    pub text_style: TextStyle,
}

/// Convert a premultiplied pixmap back into straight-alpha RGBA
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    // Buffer length always matches width * height * 4
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

/// Fill the whole surface with one straight-alpha color
pub fn clear(pixmap: &mut Pixmap, rgba: [u8; 4]) {
    let [r, g, b, a] = rgba;
    pixmap.fill(Color::from_rgba8(r, g, b, a));
}

/// Draw `src` with its top-left at the origin of `transform`
pub fn draw_pixmap(target: &mut Pixmap, src: &Pixmap, transform: Transform) {
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
}

/// Stretch a raster over `rect` (device pixels), ignoring its aspect ratio
pub fn draw_raster_in_rect(target: &mut Pixmap, src: &Raster, rect: Rect) {
    let transform = Transform::from_row(
        rect.width() / src.width() as f32,
        0.0,
        0.0,
        rect.height() / src.height() as f32,
        rect.left,
        rect.top,
    );
    draw_pixmap(target, src.pixmap(), transform);
}

/// Draw the scene onto `pixmap` at the given view.
///
/// `surface_scale` multiplies everything after the view transform; use 1 for
/// the display and the oversample factor for exports.
pub fn draw_scene(
    pixmap: &mut Pixmap,
    scene: &Scene<'_>,
    font: &TextFont,
    view: &ViewTransform,
    surface_scale: f32,
) {
    let base = geometry::device_transform(view, surface_scale);

    if let Some(background) = scene.background {
        draw_pixmap(pixmap, background.pixmap(), base);
    }

    if let Some(text) = scene.text
        && text.is_visible()
    {
        draw_text(pixmap, text, scene.text_style, font, view, surface_scale);
    }

    if let Some(signature) = &scene.signature {
        let transform = base
            .pre_translate(signature.position.x, signature.position.y)
            .pre_scale(signature.scale, signature.scale);
        draw_pixmap(pixmap, signature.image.pixmap(), transform);
    }
}

fn draw_text(
    pixmap: &mut Pixmap,
    text: &TextOverlay,
    style: TextStyle,
    font: &TextFont,
    view: &ViewTransform,
    surface_scale: f32,
) {
    let font_px = text_font_size(text, style.base_font_size) * view.zoom * surface_scale;
    let origin = document_to_device(text.position, view, surface_scale);
    if let Some(glyphs) = font.rasterize(&text.content, font_px, style.color, origin, tiny_skia::IntSize::from_wh(pixmap.width(), pixmap.height()).expect("pixmap has non-zero size")) {
        draw_pixmap(
            pixmap,
            &glyphs.pixmap,
            Transform::from_translate(glyphs.left as f32, glyphs.top as f32),
        );
    }
}

/// Read one pixel as straight-alpha RGBA, `None` outside the surface
pub fn pixel_at(pixmap: &Pixmap, x: u32, y: u32) -> Option<[u8; 4]> {
    let c: PremultipliedColorU8 = pixmap.pixel(x, y)?;
    let c = c.demultiply();
    Some([c.red(), c.green(), c.blue(), c.alpha()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;
    use image::Rgba;

    const STYLE: TextStyle = TextStyle {
        base_font_size: 24.0,
        color: [0, 0, 0, 255],
    };

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Raster {
        Raster::new(RgbaImage::from_pixel(w, h, Rgba(rgba))).unwrap()
    }

    #[test]
    fn test_pixmap_round_trip_preserves_opaque_pixels() {
        let img = RgbaImage::from_fn(4, 3, |x, y| Rgba([x as u8 * 40, y as u8 * 60, 7, 255]));
        let raster = Raster::new(img.clone()).unwrap();
        assert_eq!(rgba_from_pixmap(raster.pixmap()), img);
    }

    #[test]
    fn test_background_drawn_at_view() {
        let bg = solid(10, 10, [255, 0, 0, 255]);
        let scene = Scene {
            background: Some(&bg),
            text: None,
            signature: None,
            text_style: STYLE,
        };
        let mut pixmap = Pixmap::new(40, 40).unwrap();
        let view = ViewTransform::new(2.0, Point::new(10.0, 10.0));
        draw_scene(&mut pixmap, &scene, &TextFont::none(), &view, 1.0);

        // Background now covers (10,10)..(30,30)
        assert_eq!(pixel_at(&pixmap, 20, 20), Some([255, 0, 0, 255]));
        assert_eq!(pixel_at(&pixmap, 5, 5).map(|c| c[3]), Some(0));
        assert_eq!(pixel_at(&pixmap, 35, 35).map(|c| c[3]), Some(0));
    }

    #[test]
    fn test_signature_drawn_on_top_with_scale() {
        let bg = solid(100, 100, [255, 255, 255, 255]);
        let sig = solid(10, 10, [0, 0, 255, 255]);
        let scene = Scene {
            background: Some(&bg),
            text: None,
            signature: Some(SignatureOverlay {
                image: &sig,
                position: Point::new(50.0, 50.0),
                scale: 2.0,
            }),
            text_style: STYLE,
        };
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        draw_scene(&mut pixmap, &scene, &TextFont::none(), &ViewTransform::IDENTITY, 1.0);

        assert_eq!(pixel_at(&pixmap, 60, 60), Some([0, 0, 255, 255]));
        assert_eq!(pixel_at(&pixmap, 68, 68), Some([0, 0, 255, 255]));
        assert_eq!(pixel_at(&pixmap, 75, 75), Some([255, 255, 255, 255]));
        assert_eq!(pixel_at(&pixmap, 45, 45), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_raster_stretched_into_rect() {
        let stamp = solid(30, 12, [0, 128, 0, 255]);
        let mut pixmap = Pixmap::new(200, 200).unwrap();
        draw_raster_in_rect(&mut pixmap, &stamp, Rect::new(20.0, 20.0, 170.0, 100.0));
        assert_eq!(pixel_at(&pixmap, 100, 60), Some([0, 128, 0, 255]));
        assert_eq!(pixel_at(&pixmap, 165, 95), Some([0, 128, 0, 255]));
        assert_eq!(pixel_at(&pixmap, 175, 60).map(|c| c[3]), Some(0));
    }
}
