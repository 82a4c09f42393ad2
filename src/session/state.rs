//! Editor object model
//!
//! Holds the document, the view transform and both overlays. All scale
//! mutators are relative and clamped; `reset_all` restores every interactive
//! default from one place.

use crate::config::EditorConfig;
use crate::domain::{
    Document, Point, Raster, ScaleRange, SignatureOverlay, SignaturePlacement, SignatureSource,
    SignatureSourceKind, TextOverlay, ViewTransform,
};
use crate::render::{Scene, TextStyle};

/// Defaults and bounds for every piece of interactive state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionDefaults {
    pub zoom_bounds: ScaleRange,
    pub overlay_scale_bounds: ScaleRange,
    pub text_position: Point,
    pub signature_position: Point,
}

impl From<&EditorConfig> for InteractionDefaults {
    fn from(config: &EditorConfig) -> Self {
        Self {
            zoom_bounds: config.zoom_bounds,
            overlay_scale_bounds: config.overlay_scale_bounds,
            text_position: config.text_default_position,
            signature_position: config.signature_default_position,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EditorState {
    document: Option<Document>,
    view: ViewTransform,
    text: TextOverlay,
    signature_source: SignatureSource,
    signature: SignaturePlacement,
    defaults: InteractionDefaults,
}

impl EditorState {
    pub fn new(defaults: InteractionDefaults) -> Self {
        Self {
            document: None,
            view: ViewTransform::IDENTITY,
            text: TextOverlay::new(String::new(), defaults.text_position),
            signature_source: SignatureSource::None,
            signature: SignaturePlacement {
                position: defaults.signature_position,
                scale: 1.0,
            },
            defaults,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        let mut state = Self::new(InteractionDefaults::from(config));
        state.set_text(config.initial_text.clone());
        state
    }

    pub fn defaults(&self) -> &InteractionDefaults {
        &self.defaults
    }

    // ------------------------------------------------------------------------
    // Document and view
    // ------------------------------------------------------------------------

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Replace the document wholesale; placements and view start fresh
    pub fn set_document(&mut self, document: Document) {
        self.document = Some(document);
        self.reset_all();
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// Set the view, clamping zoom into bounds
    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = ViewTransform {
            zoom: self.defaults.zoom_bounds.clamp(view.zoom),
            pan: view.pan,
        };
    }

    // ------------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------------

    pub fn set_text(&mut self, content: impl Into<String>) {
        self.text.content = content.into();
    }

    pub fn move_text(&mut self, position: Point) {
        self.text.position = position;
    }

    /// Multiply the text scale by `factor`, clamped
    pub fn scale_text(&mut self, factor: f32) {
        self.text.scale = self
            .defaults
            .overlay_scale_bounds
            .clamp(self.text.scale * factor);
    }

    /// The text layer, whether or not it is currently visible
    pub fn text(&self) -> &TextOverlay {
        &self.text
    }

    /// The live text overlay; `None` while the content is empty
    pub fn text_overlay(&self) -> Option<&TextOverlay> {
        self.text.is_visible().then_some(&self.text)
    }

    // ------------------------------------------------------------------------
    // Signature
    // ------------------------------------------------------------------------

    /// Replace the signature outright, dropping both sources
    pub fn set_signature_image(&mut self, image: Option<Raster>) {
        self.signature_source = match image {
            Some(raster) => SignatureSource::Uploaded(raster),
            None => SignatureSource::None,
        };
    }

    pub fn set_drawn_signature(&mut self, image: Option<Raster>) {
        let source = std::mem::take(&mut self.signature_source);
        self.signature_source = source.with_drawn(image);
    }

    pub fn set_uploaded_signature(&mut self, image: Option<Raster>) {
        let source = std::mem::take(&mut self.signature_source);
        self.signature_source = source.with_uploaded(image);
    }

    pub fn signature_source_kind(&self) -> SignatureSourceKind {
        self.signature_source.kind()
    }

    pub fn move_signature(&mut self, position: Point) {
        self.signature.position = position;
    }

    /// Multiply the signature scale by `factor`, clamped
    pub fn scale_signature(&mut self, factor: f32) {
        self.signature.scale = self
            .defaults
            .overlay_scale_bounds
            .clamp(self.signature.scale * factor);
    }

    pub fn signature_placement(&self) -> &SignaturePlacement {
        &self.signature
    }

    /// The live signature overlay; `None` while no source is set
    pub fn signature_overlay(&self) -> Option<SignatureOverlay<'_>> {
        self.signature_source
            .active()
            .map(|image| SignatureOverlay {
                image,
                position: self.signature.position,
                scale: self.signature.scale,
            })
    }

    // ------------------------------------------------------------------------
    // Reset and rendering
    // ------------------------------------------------------------------------

    /// Restore overlay positions, overlay scales and the view to defaults.
    /// Content (text, signature sources, document) is kept.
    pub fn reset_all(&mut self) {
        self.text.position = self.defaults.text_position;
        self.text.scale = 1.0;
        self.signature.position = self.defaults.signature_position;
        self.signature.scale = 1.0;
        self.view = ViewTransform::IDENTITY;
    }

    /// Borrow everything the compositor draws
    pub fn scene(&self, text_style: TextStyle) -> Scene<'_> {
        Scene {
            background: self.document.as_ref().map(Document::primary_page),
            text: self.text_overlay(),
            signature: self.signature_overlay(),
            text_style,
        }
    }
}
