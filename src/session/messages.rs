//! Message types for an editing session
//!
//! This module contains:
//! - Msg enum with nested sub-enums for organized message handling
//! - Command enum for work the actor must run off the message loop

use tokio::sync::oneshot;

use crate::domain::{Document, Point, Raster};
use crate::error::Result;
use crate::loader::{LoadTicket, SignatureInput, SignatureSlot, SourceData};

// ============================================================================
// Input Messages
// ============================================================================

/// Pointer and wheel input, screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMsg {
    /// Button pressed at position
    PointerDown(Point),
    /// Pointer moved to position
    PointerMove(Point),
    /// Button released
    PointerUp,
    /// One wheel tick at position; negative delta means wheel up
    Wheel { position: Point, delta_y: f32 },
}

// ============================================================================
// Edit Messages
// ============================================================================

/// Content changes coming from the surrounding UI
#[derive(Debug, Clone)]
pub enum EditMsg {
    /// Replace the text overlay content
    SetText(String),
    /// Load a new background document
    OpenDocument(SourceData),
    /// Load a new signature into a slot
    LoadSignature(SignatureSlot, SignatureInput),
    /// Clear one signature slot
    ClearSignature(SignatureSlot),
    /// Restore default positions, scales and view
    ResetAll,
}

// ============================================================================
// Load Completion Messages
// ============================================================================

/// Results posted back by background loads
#[derive(Debug)]
pub enum LoadMsg {
    DocumentLoaded {
        ticket: LoadTicket,
        result: Result<Document>,
    },
    SignatureLoaded {
        ticket: LoadTicket,
        result: Result<Raster>,
    },
}

// ============================================================================
// Export Types
// ============================================================================

/// Where an export goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Flattened raster as PNG bytes
    Png,
    /// One-page PDF assembled locally
    LocalPdf,
    /// PDF produced by the conversion service; `None` uses the configured URL
    Remote { base_url: Option<String> },
}

pub type ExportReply = oneshot::Sender<Result<Vec<u8>>>;

// ============================================================================
// Main Message Enum
// ============================================================================

#[derive(Debug)]
pub enum Msg {
    Input(InputMsg),
    Edit(EditMsg),
    Load(LoadMsg),
    Export {
        target: ExportTarget,
        reply: ExportReply,
    },
}

impl From<InputMsg> for Msg {
    fn from(msg: InputMsg) -> Self {
        Msg::Input(msg)
    }
}

impl From<EditMsg> for Msg {
    fn from(msg: EditMsg) -> Self {
        Msg::Edit(msg)
    }
}

impl From<LoadMsg> for Msg {
    fn from(msg: LoadMsg) -> Self {
        Msg::Load(msg)
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Work the editor hands back to its runner
#[derive(Debug)]
pub enum Command {
    LoadDocument {
        ticket: LoadTicket,
        source: SourceData,
        pdf_render_scale: f32,
    },
    LoadSignature {
        ticket: LoadTicket,
        input: SignatureInput,
    },
    /// Send a flattened PNG to the conversion service
    Convert {
        png: Vec<u8>,
        base_url: String,
        reply: ExportReply,
    },
}
