//! Signature stamping across the pages of a multi-page document
//!
//! Each click records a stamp at a page position. Stamps are only composited
//! at export, so swapping the signature afterwards restamps every page.

use crate::config::EditorConfig;
use crate::domain::{Document, PageList, Point, Raster, Rect};

/// Stamp size in page pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampSize {
    pub width: f32,
    pub height: f32,
}

impl From<&EditorConfig> for StampSize {
    fn from(config: &EditorConfig) -> Self {
        Self {
            width: config.stamp_width,
            height: config.stamp_height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageSigner {
    pages: PageList,
    signature: Option<Raster>,
    /// Stamp top-left corners per page, in page pixels
    placements: Vec<Vec<Point>>,
    stamp: StampSize,
}

impl PageSigner {
    pub fn new(pages: PageList, stamp: StampSize) -> Self {
        let placements = vec![Vec::new(); pages.len()];
        Self {
            pages,
            signature: None,
            placements,
            stamp,
        }
    }

    pub fn from_document(document: Document, stamp: StampSize) -> Option<Self> {
        PageList::new(document.into_pages()).map(|pages| Self::new(pages, stamp))
    }

    pub fn pages(&self) -> &PageList {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn signature(&self) -> Option<&Raster> {
        self.signature.as_ref()
    }

    pub fn set_signature(&mut self, signature: Option<Raster>) {
        self.signature = signature;
    }

    /// Record a stamp with its top-left at `at` (page pixels).
    ///
    /// Returns false when there is no signature yet or the page does not
    /// exist; nothing is recorded then.
    pub fn place_signature(&mut self, page: usize, at: Point) -> bool {
        if self.signature.is_none() || !at.is_finite() {
            return false;
        }
        let Some(stamps) = self.placements.get_mut(page) else {
            return false;
        };
        stamps.push(at);
        log::debug!("Stamp on page {} at {:?}", page + 1, at);
        true
    }

    /// Convert a click on a page shown `displayed_width` pixels wide into
    /// page pixels
    pub fn display_to_page(&self, page: usize, click: Point, displayed_width: f32) -> Option<Point> {
        let raster = self.pages.get(page)?;
        if displayed_width.is_nan() || displayed_width <= 0.0 {
            return None;
        }
        Some(click * (raster.width() as f32 / displayed_width))
    }

    pub fn placements(&self, page: usize) -> &[Point] {
        self.placements.get(page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear_placements(&mut self, page: usize) {
        if let Some(stamps) = self.placements.get_mut(page) {
            stamps.clear();
        }
    }

    /// Stamp rectangles for a page, in page pixels
    pub fn stamp_rects(&self, page: usize) -> impl Iterator<Item = Rect> + '_ {
        let stamp = self.stamp;
        self.placements(page)
            .iter()
            .map(move |at| Rect::from_origin_size(*at, stamp.width, stamp.height))
    }
}
