//! Configuration persistence for signify settings
//!
//! Every interactive default lives here, including the positions and scales
//! that `reset_all` restores.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{Point, ScaleRange};

/// Serializable color representation for config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for TextColor {
    fn default() -> Self {
        // Slate #1e293b
        Self {
            r: 30.0 / 255.0,
            g: 41.0 / 255.0,
            b: 59.0 / 255.0,
        }
    }
}

impl TextColor {
    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            255,
        ]
    }
}

/// How big each page of a single-image export is, in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSizing {
    /// One point per document pixel; the oversampled raster is fitted into it
    #[default]
    DocumentPixels,
    /// One point per exported raster pixel
    RasterPixels,
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Allowed stage zoom range
    pub zoom_bounds: ScaleRange,
    /// Stage zoom ratio applied per wheel tick
    pub zoom_step: f32,
    /// Allowed overlay scale range
    pub overlay_scale_bounds: ScaleRange,
    /// Overlay scale ratio applied per wheel tick
    pub overlay_scale_step: f32,
    /// Where the text goes on reset, in document coordinates
    pub text_default_position: Point,
    /// Where the signature goes on reset, in document coordinates
    pub signature_default_position: Point,
    /// Initial text content for a fresh session
    pub initial_text: String,
    /// Font size in document pixels at text scale 1.0
    pub base_font_size: f32,
    pub text_color: TextColor,
    /// TrueType/OpenType font file; system fonts are searched when unset
    pub font_path: Option<PathBuf>,
    /// Export raster resolution relative to the document
    pub oversample: NonZeroU32,
    /// Width of the interactive display surface in pixels
    pub display_width: u32,
    /// Height of the interactive display surface in pixels
    pub display_height: u32,
    /// Scale at which PDF pages are rasterized
    pub pdf_render_scale: f32,
    /// Signature stamp size on multi-page documents, in page pixels
    pub stamp_width: f32,
    pub stamp_height: f32,
    /// Base URL of the remote PDF conversion service
    pub backend_url: String,
    /// File name used for the exported PDF
    pub output_filename: String,
    pub page_sizing: PageSizing,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom_bounds: ScaleRange::new(0.3, 4.0),
            zoom_step: 1.05,
            overlay_scale_bounds: ScaleRange::new(0.1, 5.0),
            overlay_scale_step: 1.1,
            text_default_position: Point::new(100.0, 100.0),
            signature_default_position: Point::new(300.0, 300.0),
            initial_text: String::new(),
            base_font_size: 24.0,
            text_color: TextColor::default(),
            font_path: None,
            oversample: NonZeroU32::MIN.saturating_add(1),
            display_width: 900,
            display_height: 700,
            pdf_render_scale: 1.5,
            stamp_width: 150.0,
            stamp_height: 80.0,
            backend_url: "http://localhost:5000".to_string(),
            output_filename: "signed.pdf".to_string(),
            page_sizing: PageSizing::DocumentPixels,
        }
    }
}

impl EditorConfig {
    /// Directory name under the platform config dir
    pub const ID: &'static str = "signify";

    /// Path of the config file, if the platform has a config dir
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            log::warn!("No config directory on this platform, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::path() else {
            log::error!("No config directory on this platform, not saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    /// Save configuration to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }

    /// Where an export lands when the caller does not pick a path
    pub fn default_output_path(&self) -> PathBuf {
        dirs::document_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Documents")))
            .unwrap_or_else(std::env::temp_dir)
            .join(&self.output_filename)
    }

    /// Replace values that would break an invariant with their defaults
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !valid_range(self.zoom_bounds) {
            log::warn!("Invalid zoom bounds {:?}, using defaults", self.zoom_bounds);
            self.zoom_bounds = defaults.zoom_bounds;
        }
        if !valid_range(self.overlay_scale_bounds) {
            log::warn!(
                "Invalid overlay scale bounds {:?}, using defaults",
                self.overlay_scale_bounds
            );
            self.overlay_scale_bounds = defaults.overlay_scale_bounds;
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            self.zoom_step = defaults.zoom_step;
        }
        if !(self.overlay_scale_step.is_finite() && self.overlay_scale_step > 1.0) {
            self.overlay_scale_step = defaults.overlay_scale_step;
        }
        if !(self.base_font_size.is_finite() && self.base_font_size > 0.0) {
            self.base_font_size = defaults.base_font_size;
        }
        if !(self.pdf_render_scale.is_finite() && self.pdf_render_scale > 0.0) {
            self.pdf_render_scale = defaults.pdf_render_scale;
        }
        if self.display_width == 0 || self.display_height == 0 {
            self.display_width = defaults.display_width;
            self.display_height = defaults.display_height;
        }
        self
    }
}

fn valid_range(range: ScaleRange) -> bool {
    range.min.is_finite() && range.max.is_finite() && range.min > 0.0 && range.min <= range.max
}
