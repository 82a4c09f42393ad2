//! Pure domain types with minimal dependencies
//!
//! This module contains the document, overlay and coordinate types used
//! throughout the crate, plus the pure transform math between screen and
//! document space. Nothing here renders, decodes files or does I/O.

pub mod document;
pub mod geometry;
pub mod overlay;
pub mod transform;

pub use document::*;
pub use geometry::*;
pub use overlay::*;
pub use transform::*;
