//! Scene rendering module
//!
//! This module contains:
//! - Geometry shared between hit testing and drawing
//! - Text measurement and glyph rasterization (ab_glyph)
//! - Scene drawing onto tiny-skia pixmaps
//! - The compositor owning the display surface and producing exports

pub mod compositor;
pub mod geometry;
pub mod image;
pub mod text;

pub use compositor::Compositor;
pub use self::image::{Scene, TextStyle};
pub use text::TextFont;
