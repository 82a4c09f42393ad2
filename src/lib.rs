//! Interactive text and signature placement over images and PDFs, flattened
//! into a signed PDF.
//!
//! The [`Editor`] owns the object model, interprets pointer and wheel input,
//! keeps a display surface up to date and produces exports that do not depend
//! on the live pan and zoom.

pub mod cli;
pub mod config;
pub mod domain;
pub mod editor;
pub mod error;
pub mod export;
pub mod loader;
pub mod render;
pub mod session;

pub use config::EditorConfig;
pub use editor::{request_export, run_editor, Editor};
pub use error::{EditorError, Result};
