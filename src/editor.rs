//! Editor facade and actor loop
//!
//! `Editor` ties the session, the compositor and the export pipeline
//! together. `update` handles one message to completion; anything slow comes
//! back as a [`Command`] for the runner. `run_editor` is that runner on tokio.

use image::RgbaImage;
use tokio::sync::mpsc;

use crate::config::EditorConfig;
use crate::domain::{Document, PixelSize};
use crate::error::{EditorError, Result};
use crate::export;
use crate::loader::{self, SignatureInput, SignatureSlot, SourceData};
use crate::render::{Compositor, TextFont, TextStyle};
use crate::session::handlers::{handle_edit_msg, handle_input_msg, handle_load_msg};
use crate::session::{
    Command, EditMsg, EditorState, ExportTarget, LoadMsg, Msg, Session, TextMetrics,
};

pub struct Editor {
    config: EditorConfig,
    session: Session,
    compositor: Compositor,
    last_error: Option<EditorError>,
}

impl Editor {
    /// Build an editor, loading the configured or a system font
    pub fn new(config: EditorConfig) -> Result<Self> {
        let font = TextFont::load(config.font_path.as_deref());
        Self::with_font(config, font)
    }

    pub fn with_font(config: EditorConfig, font: TextFont) -> Result<Self> {
        let display = PixelSize::new(config.display_width, config.display_height).ok_or_else(|| {
            EditorError::render(format!(
                "invalid display size {}x{}",
                config.display_width, config.display_height
            ))
        })?;
        let compositor = Compositor::new(display, font, config.oversample)?;
        let mut editor = Self {
            session: Session::new(&config),
            config,
            compositor,
            last_error: None,
        };
        editor.redraw();
        Ok(editor)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &EditorState {
        &self.session.state
    }

    /// Direct access to the object model for headless callers
    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.session.state
    }

    pub fn font(&self) -> &TextFont {
        self.compositor.font()
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            base_font_size: self.config.base_font_size,
            color: self.config.text_color.to_rgba_u8(),
        }
    }

    /// The last interactive frame
    pub fn display_image(&self) -> RgbaImage {
        self.compositor.display_image()
    }

    pub fn frames(&self) -> u64 {
        self.compositor.frames()
    }

    /// The most recent load failure, cleared on read
    pub fn take_error(&mut self) -> Option<EditorError> {
        self.last_error.take()
    }

    /// Redraw the display at the live view
    pub fn redraw(&mut self) {
        let style = self.text_style();
        let scene = self.session.state.scene(style);
        self.compositor
            .render_interactive(&scene, self.session.state.view());
    }

    /// Handle one message to completion
    pub fn update(&mut self, msg: Msg) -> Option<Command> {
        match msg {
            Msg::Input(input) => {
                let metrics = TextMetrics {
                    font: self.compositor.font(),
                    base_font_size: self.config.base_font_size,
                };
                if handle_input_msg(&mut self.session, metrics, input) {
                    self.redraw();
                }
                None
            }
            Msg::Edit(edit) => {
                let command = handle_edit_msg(&mut self.session, &self.config, edit);
                if command.is_none() {
                    self.redraw();
                }
                command
            }
            Msg::Load(load) => {
                match handle_load_msg(&mut self.session, load) {
                    Ok(true) => self.redraw(),
                    Ok(false) => {}
                    Err(err) => {
                        log::warn!("Load failed: {}", err);
                        self.last_error = Some(err);
                    }
                }
                None
            }
            Msg::Export { target, reply } => match target {
                ExportTarget::Png => {
                    let _ = reply.send(self.export_png());
                    None
                }
                ExportTarget::LocalPdf => {
                    let _ = reply.send(self.export_pdf());
                    None
                }
                ExportTarget::Remote { base_url } => match self.export_png() {
                    Ok(png) => Some(Command::Convert {
                        png,
                        base_url: base_url.unwrap_or_else(|| self.config.backend_url.clone()),
                        reply,
                    }),
                    Err(err) => {
                        let _ = reply.send(Err(err));
                        None
                    }
                },
            },
        }
    }

    // ------------------------------------------------------------------------
    // Synchronous loading, same ticket path as the actor
    // ------------------------------------------------------------------------

    /// Load a document on the calling thread
    pub fn open_document(&mut self, source: SourceData) -> Result<()> {
        match self.update(Msg::Edit(EditMsg::OpenDocument(source))) {
            Some(Command::LoadDocument {
                ticket,
                source,
                pdf_render_scale,
            }) => {
                let result = loader::load_document(source, pdf_render_scale);
                self.finish_load(LoadMsg::DocumentLoaded { ticket, result })
            }
            _ => Ok(()),
        }
    }

    /// Load a signature on the calling thread
    pub fn load_signature(&mut self, slot: SignatureSlot, input: SignatureInput) -> Result<()> {
        match self.update(Msg::Edit(EditMsg::LoadSignature(slot, input))) {
            Some(Command::LoadSignature { ticket, input }) => {
                let result = loader::load_signature(input);
                self.finish_load(LoadMsg::SignatureLoaded { ticket, result })
            }
            _ => Ok(()),
        }
    }

    fn finish_load(&mut self, msg: LoadMsg) -> Result<()> {
        self.update(Msg::Load(msg));
        match self.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    /// Flatten the primary page at the identity view.
    ///
    /// Output is `document × oversample` pixels and does not depend on the
    /// live view. The display is redrawn afterwards; no model state changes.
    pub fn export_raster(&mut self) -> Result<RgbaImage> {
        let style = self.text_style();
        let state = &self.session.state;
        let Some(document) = state.document() else {
            return Err(EditorError::render("no document loaded"));
        };
        let scene = state.scene(style);
        self.compositor.export(&scene, document.size(), state.view())
    }

    pub fn export_png(&mut self) -> Result<Vec<u8>> {
        let raster = self.export_raster()?;
        export::encode_png(&raster)
    }

    /// One-page PDF of the flattened composition
    pub fn export_pdf(&mut self) -> Result<Vec<u8>> {
        let raster = self.export_raster()?;
        let size = self
            .session
            .state
            .document()
            .map(Document::size)
            .ok_or_else(|| EditorError::render("no document loaded"))?;
        export::single_page_pdf(&raster, size, self.config.page_sizing)
    }
}

// ============================================================================
// Actor runner
// ============================================================================

/// Drive `editor` from `rx` until every sender is gone.
///
/// `tx` lets background work post results back; it is held weakly so the
/// loop can end once callers drop their senders and no load is in flight.
pub async fn run_editor(
    mut editor: Editor,
    mut rx: mpsc::UnboundedReceiver<Msg>,
    tx: mpsc::WeakUnboundedSender<Msg>,
) -> Editor {
    let client = reqwest::Client::new();
    while let Some(msg) = rx.recv().await {
        if let Some(command) = editor.update(msg) {
            spawn_command(command, &tx, &client);
        }
    }
    log::debug!("Editor loop finished");
    editor
}

fn spawn_command(command: Command, tx: &mpsc::WeakUnboundedSender<Msg>, client: &reqwest::Client) {
    match command {
        Command::LoadDocument {
            ticket,
            source,
            pdf_render_scale,
        } => {
            let Some(tx) = tx.upgrade() else {
                return;
            };
            tokio::spawn(async move {
                let result = tokio::task::spawn_blocking(move || {
                    loader::load_document(source, pdf_render_scale)
                })
                .await
                .unwrap_or_else(|err| Err(EditorError::load("document", err)));
                let _ = tx.send(Msg::Load(LoadMsg::DocumentLoaded { ticket, result }));
            });
        }
        Command::LoadSignature { ticket, input } => {
            let Some(tx) = tx.upgrade() else {
                return;
            };
            tokio::spawn(async move {
                let result = tokio::task::spawn_blocking(move || loader::load_signature(input))
                    .await
                    .unwrap_or_else(|err| Err(EditorError::load("signature", err)));
                let _ = tx.send(Msg::Load(LoadMsg::SignatureLoaded { ticket, result }));
            });
        }
        Command::Convert {
            png,
            base_url,
            reply,
        } => {
            let client = client.clone();
            tokio::spawn(async move {
                let result = export::remote::convert(&client, &base_url, png).await;
                if let Err(err) = &result {
                    log::error!("Remote conversion failed: {}", err);
                }
                let _ = reply.send(result);
            });
        }
    }
}

/// Ask a running editor for an export and wait for it
pub async fn request_export(tx: &mpsc::UnboundedSender<Msg>, target: ExportTarget) -> Result<Vec<u8>> {
    let (reply, response) = tokio::sync::oneshot::channel();
    tx.send(Msg::Export { target, reply })
        .map_err(|_| EditorError::render("editor is not running"))?;
    response
        .await
        .map_err(|_| EditorError::render("editor dropped the export request"))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Point, Raster, ViewTransform};
    use crate::session::InputMsg;
    use image::Rgba;

    fn editor_with_background(w: u32, h: u32) -> Editor {
        let mut editor = Editor::with_font(EditorConfig::default(), TextFont::none()).unwrap();
        let bg = Raster::new(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))).unwrap();
        editor.state_mut().set_document(Document::SingleImage(bg));
        editor
    }

    #[test]
    fn test_export_without_document_fails() {
        let mut editor = Editor::with_font(EditorConfig::default(), TextFont::none()).unwrap();
        assert!(matches!(editor.export_pdf(), Err(EditorError::Render(_))));
    }

    #[test]
    fn test_export_leaves_view_untouched() {
        let mut editor = editor_with_background(100, 80);
        let view = ViewTransform::new(2.5, Point::new(-30.0, 12.0));
        editor.state_mut().set_view(view);
        let raster = editor.export_raster().unwrap();
        assert_eq!(raster.dimensions(), (200, 160));
        assert_eq!(*editor.state().view(), view);
    }

    #[test]
    fn test_input_redraws_display() {
        let mut editor = editor_with_background(100, 80);
        let before = editor.frames();
        editor.update(Msg::Input(InputMsg::PointerDown(Point::new(10.0, 10.0))));
        editor.update(Msg::Input(InputMsg::PointerMove(Point::new(40.0, 10.0))));
        assert_eq!(editor.frames(), before + 1);
        assert_eq!(editor.state().view().pan, Point::new(30.0, 0.0));
        assert_eq!(editor.display_image().get_pixel(35, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_failed_load_is_reported() {
        let mut editor = editor_with_background(10, 10);
        let err = editor
            .open_document(SourceData::Bytes(b"not an image".to_vec()))
            .unwrap_err();
        assert!(matches!(err, EditorError::Load { .. }));
        // Previous document stays
        assert_eq!(editor.state().document().map(|d| d.size().width()), Some(10));
    }

    #[tokio::test]
    async fn test_actor_round_trip() {
        let editor = Editor::with_font(EditorConfig::default(), TextFont::none()).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = tokio::spawn(run_editor(editor, rx, tx.downgrade()));

        let mut png = Vec::new();
        export::write_png(&mut png, &RgbaImage::from_pixel(64, 48, Rgba([9, 9, 9, 255]))).unwrap();
        tx.send(Msg::Edit(EditMsg::OpenDocument(SourceData::Bytes(png))))
            .unwrap();

        // The load completes in the background; poll until it lands
        let mut exported = None;
        for _ in 0..500 {
            match request_export(&tx, ExportTarget::Png).await {
                Ok(bytes) => {
                    exported = Some(bytes);
                    break;
                }
                Err(_) => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
            }
        }
        let bytes = exported.expect("document never loaded");
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (128, 96));

        drop(tx);
        let editor = runner.await.unwrap();
        assert!(editor.state().document().is_some());
    }
}
