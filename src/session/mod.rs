//! Editing session
//!
//! This module contains:
//! - The object model (document, view, overlays)
//! - Gesture interpretation for pointer and wheel input
//! - Message types and their handlers
//! - Multi-page signature stamping

pub mod gesture;
pub mod handlers;
pub mod messages;
pub mod pages;
pub mod state;

pub use gesture::{DragTarget, GestureController, GestureState, TextMetrics, WheelSteps};
pub use messages::{Command, EditMsg, ExportTarget, InputMsg, LoadMsg, Msg};
pub use pages::{PageSigner, StampSize};
pub use state::EditorState;

use crate::config::EditorConfig;
use crate::loader::LoadTracker;

/// Mutable session state owned by the message loop
#[derive(Debug)]
pub struct Session {
    pub state: EditorState,
    pub gestures: GestureController,
    pub loads: LoadTracker,
}

impl Session {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: EditorState::from_config(config),
            gestures: GestureController::new(WheelSteps::from(config)),
            loads: LoadTracker::default(),
        }
    }
}
