//! Errors reported at the editor boundary
//!
//! Each variant names the stage that failed. None of them is fatal: the user
//! re-triggers the action.

/// Failure surfaced to the user by a load or export
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// File unreadable or in an unsupported format
    #[error("could not load {what}: {detail}")]
    Load { what: &'static str, detail: String },

    /// Raster capture or encoding failed
    #[error("render failed: {0}")]
    Render(String),

    /// Local PDF assembly or the remote conversion failed
    #[error("PDF conversion failed: {detail}")]
    Conversion {
        detail: String,
        /// HTTP status when the remote service answered at all
        status: Option<u16>,
    },
}

impl EditorError {
    pub fn load(what: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::Load {
            what,
            detail: detail.to_string(),
        }
    }

    pub fn render(detail: impl std::fmt::Display) -> Self {
        Self::Render(detail.to_string())
    }

    pub fn conversion(detail: impl std::fmt::Display) -> Self {
        Self::Conversion {
            detail: detail.to_string(),
            status: None,
        }
    }
}

impl From<lopdf::Error> for EditorError {
    fn from(err: lopdf::Error) -> Self {
        Self::conversion(err)
    }
}

impl From<reqwest::Error> for EditorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Conversion {
            detail: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

impl From<image::ImageError> for EditorError {
    fn from(err: image::ImageError) -> Self {
        Self::load("image", err)
    }
}

impl From<std::io::Error> for EditorError {
    fn from(err: std::io::Error) -> Self {
        Self::load("file", err)
    }
}

impl From<png::EncodingError> for EditorError {
    fn from(err: png::EncodingError) -> Self {
        Self::render(err)
    }
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
