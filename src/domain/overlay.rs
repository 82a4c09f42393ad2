//! Overlay layers drawn on top of the document
//!
//! All overlay positions are in document coordinates: the top-left corner of
//! the overlay in the background's own pixel space.

use super::document::Raster;
use super::geometry::Point;

/// Free-form text layer. Drawn only while `content` is non-empty.
#[derive(Clone, Debug, PartialEq)]
pub struct TextOverlay {
    pub content: String,
    /// Top-left of the text box in document coordinates
    pub position: Point,
    /// Multiplier on the base font size
    pub scale: f32,
}

impl TextOverlay {
    pub fn new(content: impl Into<String>, position: Point) -> Self {
        Self {
            content: content.into(),
            position,
            scale: 1.0,
        }
    }

    pub fn is_visible(&self) -> bool {
        !self.content.is_empty()
    }
}

/// Signature layer placement. The image comes from the active [`SignatureSource`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignaturePlacement {
    /// Top-left of the signature in document coordinates
    pub position: Point,
    /// Multiplier on the raster's pixel size
    pub scale: f32,
}

/// A live signature overlay: the active raster plus its placement
#[derive(Clone, Copy, Debug)]
pub struct SignatureOverlay<'a> {
    pub image: &'a Raster,
    pub position: Point,
    pub scale: f32,
}

impl SignatureOverlay<'_> {
    /// Size in document pixels after scaling
    pub fn extent(&self) -> (f32, f32) {
        (
            self.image.width() as f32 * self.scale,
            self.image.height() as f32 * self.scale,
        )
    }
}

/// Which source currently feeds the signature overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureSourceKind {
    None,
    Drawn,
    Uploaded,
}

/// Where the signature raster comes from.
///
/// A drawn signature takes precedence over an uploaded one. The uploaded
/// raster is remembered underneath a drawn one so clearing the drawing falls
/// back to it.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SignatureSource {
    #[default]
    None,
    Uploaded(Raster),
    Drawn {
        drawn: Raster,
        uploaded: Option<Raster>,
    },
}

impl SignatureSource {
    pub fn kind(&self) -> SignatureSourceKind {
        match self {
            SignatureSource::None => SignatureSourceKind::None,
            SignatureSource::Uploaded(_) => SignatureSourceKind::Uploaded,
            SignatureSource::Drawn { .. } => SignatureSourceKind::Drawn,
        }
    }

    /// The raster that should be displayed, honoring precedence
    pub fn active(&self) -> Option<&Raster> {
        match self {
            SignatureSource::None => None,
            SignatureSource::Uploaded(raster) => Some(raster),
            SignatureSource::Drawn { drawn, .. } => Some(drawn),
        }
    }

    /// Replace or clear the drawn signature
    pub fn with_drawn(self, drawn: Option<Raster>) -> Self {
        let uploaded = self.into_uploaded();
        match (drawn, uploaded) {
            (Some(drawn), uploaded) => SignatureSource::Drawn { drawn, uploaded },
            (None, Some(uploaded)) => SignatureSource::Uploaded(uploaded),
            (None, None) => SignatureSource::None,
        }
    }

    /// Replace or clear the uploaded signature
    pub fn with_uploaded(self, uploaded: Option<Raster>) -> Self {
        match (self, uploaded) {
            (SignatureSource::Drawn { drawn, .. }, uploaded) => {
                SignatureSource::Drawn { drawn, uploaded }
            }
            (_, Some(uploaded)) => SignatureSource::Uploaded(uploaded),
            (_, None) => SignatureSource::None,
        }
    }

    fn into_uploaded(self) -> Option<Raster> {
        match self {
            SignatureSource::None => None,
            SignatureSource::Uploaded(raster) => Some(raster),
            SignatureSource::Drawn { uploaded, .. } => uploaded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn raster(tag: u8) -> Raster {
        Raster::new(RgbaImage::from_pixel(2, 2, Rgba([tag, 0, 0, 255]))).unwrap()
    }

    fn tag(source: &SignatureSource) -> Option<u8> {
        source.active().map(|r| r.as_rgba().get_pixel(0, 0)[0])
    }

    #[test]
    fn test_drawn_overrides_uploaded() {
        let source = SignatureSource::None.with_uploaded(Some(raster(1)));
        assert_eq!(source.kind(), SignatureSourceKind::Uploaded);
        assert_eq!(tag(&source), Some(1));

        let source = source.with_drawn(Some(raster(2)));
        assert_eq!(source.kind(), SignatureSourceKind::Drawn);
        assert_eq!(tag(&source), Some(2));

        // A new upload while a drawing exists stays underneath
        let source = source.with_uploaded(Some(raster(3)));
        assert_eq!(tag(&source), Some(2));
    }

    #[test]
    fn test_clearing_drawn_falls_back_to_uploaded() {
        let source = SignatureSource::None
            .with_uploaded(Some(raster(1)))
            .with_drawn(Some(raster(2)))
            .with_drawn(None);
        assert_eq!(source.kind(), SignatureSourceKind::Uploaded);
        assert_eq!(tag(&source), Some(1));
    }

    #[test]
    fn test_clearing_both_removes_signature() {
        let source = SignatureSource::None
            .with_uploaded(Some(raster(1)))
            .with_drawn(Some(raster(2)))
            .with_uploaded(None)
            .with_drawn(None);
        assert_eq!(source, SignatureSource::None);
        assert!(source.active().is_none());
    }

    #[test]
    fn test_text_visibility() {
        assert!(!TextOverlay::new("", Point::ORIGIN).is_visible());
        assert!(TextOverlay::new("Hello", Point::ORIGIN).is_visible());
    }
}
