//! Display surface and export rendering
//!
//! The compositor owns the persistent display surface. Interactive frames use
//! the live view; exports render the same scene at the identity view into a
//! fresh offscreen surface sized to the document times the oversample factor.

use std::num::NonZeroU32;

use image::RgbaImage;
use tiny_skia::Pixmap;

use super::geometry::BACKDROP;
use super::image::{self as draw, Scene};
use super::text::TextFont;
use crate::domain::{PixelSize, ViewTransform};
use crate::error::{EditorError, Result};

pub struct Compositor {
    display: Pixmap,
    font: TextFont,
    oversample: NonZeroU32,
    frames: u64,
}

impl Compositor {
    pub fn new(display: PixelSize, font: TextFont, oversample: NonZeroU32) -> Result<Self> {
        let display = Pixmap::new(display.width(), display.height()).ok_or_else(|| {
            EditorError::render(format!(
                "cannot allocate {}x{} display surface",
                display.width(),
                display.height()
            ))
        })?;
        Ok(Self {
            display,
            font,
            oversample,
            frames: 0,
        })
    }

    pub fn font(&self) -> &TextFont {
        &self.font
    }

    pub fn oversample(&self) -> NonZeroU32 {
        self.oversample
    }

    /// The last interactive frame
    pub fn display(&self) -> &Pixmap {
        &self.display
    }

    /// The last interactive frame as straight-alpha RGBA
    pub fn display_image(&self) -> RgbaImage {
        draw::rgba_from_pixmap(&self.display)
    }

    /// Number of interactive frames drawn so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Redraw the display surface from scratch at `view`
    pub fn render_interactive(&mut self, scene: &Scene<'_>, view: &ViewTransform) {
        draw::clear(&mut self.display, BACKDROP);
        draw::draw_scene(&mut self.display, scene, &self.font, view, 1.0);
        self.frames += 1;
    }

    /// Flatten the scene at the identity view into a raster of
    /// `document × oversample` pixels.
    ///
    /// The result depends only on the scene, never on the live view.
    pub fn render_export(&self, scene: &Scene<'_>, document: PixelSize) -> Result<RgbaImage> {
        let size = document.scaled(self.oversample).ok_or_else(|| {
            EditorError::render(format!(
                "{}x{} document is too large to oversample",
                document.width(),
                document.height()
            ))
        })?;
        let mut surface = Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            EditorError::render(format!(
                "cannot allocate {}x{} export surface",
                size.width(),
                size.height()
            ))
        })?;

        draw::draw_scene(
            &mut surface,
            scene,
            &self.font,
            &ViewTransform::IDENTITY,
            self.oversample.get() as f32,
        );
        log::debug!("Export surface rendered at {}x{}", size.width(), size.height());
        Ok(draw::rgba_from_pixmap(&surface))
    }

    /// Export, then redraw the display at the live view
    pub fn export(
        &mut self,
        scene: &Scene<'_>,
        document: PixelSize,
        live_view: &ViewTransform,
    ) -> Result<RgbaImage> {
        let flattened = self.render_export(scene, document);
        self.render_interactive(scene, live_view);
        flattened
    }
}
