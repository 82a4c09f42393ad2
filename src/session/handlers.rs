//! Session message handlers
//!
//! Handles InputMsg, EditMsg and LoadMsg against the session state. Export
//! needs the compositor and lives on the editor.

use crate::config::EditorConfig;
use crate::loader::{LoadSlot, SignatureSlot};
use crate::session::gesture::TextMetrics;
use crate::session::messages::{Command, EditMsg, InputMsg, LoadMsg};
use crate::session::Session;

/// Handle an InputMsg. Returns true when the display needs a redraw.
pub fn handle_input_msg(session: &mut Session, metrics: TextMetrics<'_>, msg: InputMsg) -> bool {
    match msg {
        InputMsg::PointerDown(position) => {
            session.gestures.pointer_down(&session.state, metrics, position);
            false
        }
        InputMsg::PointerMove(position) => session.gestures.pointer_move(&mut session.state, position),
        InputMsg::PointerUp => {
            session.gestures.pointer_up();
            false
        }
        InputMsg::Wheel { position, delta_y } => {
            session
                .gestures
                .wheel(&mut session.state, metrics, position, delta_y)
        }
    }
}

/// Handle an EditMsg, returning background work to start if any
pub fn handle_edit_msg(
    session: &mut Session,
    config: &EditorConfig,
    msg: EditMsg,
) -> Option<Command> {
    match msg {
        EditMsg::SetText(content) => {
            session.state.set_text(content);
            None
        }
        EditMsg::OpenDocument(source) => {
            let ticket = session.loads.begin(LoadSlot::Document);
            log::info!("Loading document");
            Some(Command::LoadDocument {
                ticket,
                source,
                pdf_render_scale: config.pdf_render_scale,
            })
        }
        EditMsg::LoadSignature(slot, input) => {
            let ticket = session.loads.begin(LoadSlot::Signature(slot));
            log::info!("Loading {:?} signature", slot);
            Some(Command::LoadSignature { ticket, input })
        }
        EditMsg::ClearSignature(slot) => {
            // A load still in flight must not resurrect what was just cleared
            session.loads.invalidate(LoadSlot::Signature(slot));
            clear_signature(session, slot);
            None
        }
        EditMsg::ResetAll => {
            session.gestures.cancel();
            session.state.reset_all();
            None
        }
    }
}

fn clear_signature(session: &mut Session, slot: SignatureSlot) {
    match slot {
        SignatureSlot::Drawn => session.state.set_drawn_signature(None),
        SignatureSlot::Uploaded => session.state.set_uploaded_signature(None),
    }
}

/// Handle a LoadMsg.
///
/// Stale results are dropped. A failed load leaves the model untouched and
/// hands the error back to the caller.
pub fn handle_load_msg(session: &mut Session, msg: LoadMsg) -> crate::error::Result<bool> {
    match msg {
        LoadMsg::DocumentLoaded { ticket, result } => {
            if !session.loads.is_current(&ticket) {
                log::debug!("Dropping stale document load");
                return Ok(false);
            }
            let document = result?;
            session.gestures.cancel();
            session.state.set_document(document);
            Ok(true)
        }
        LoadMsg::SignatureLoaded { ticket, result } => {
            if !session.loads.is_current(&ticket) {
                log::debug!("Dropping stale signature load");
                return Ok(false);
            }
            let raster = result?;
            match ticket.slot {
                LoadSlot::Signature(SignatureSlot::Drawn) => {
                    session.state.set_drawn_signature(Some(raster))
                }
                LoadSlot::Signature(SignatureSlot::Uploaded) => {
                    session.state.set_uploaded_signature(Some(raster))
                }
                LoadSlot::Document => {
                    log::warn!("Signature result carried a document ticket, ignoring");
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}
