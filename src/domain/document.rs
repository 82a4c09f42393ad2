//! Decoded rasters and the background document they make up

use image::RgbaImage;
use tiny_skia::{IntSize, Pixmap};

use super::geometry::PixelSize;

/// A decoded RGBA bitmap.
///
/// Owned by exactly one overlay or page. Replacing content means building a
/// new `Raster`; nothing mutates one in place, so the premultiplied copy used
/// for drawing is computed once here and reused by every frame.
#[derive(Clone)]
pub struct Raster {
    rgba: RgbaImage,
    pixmap: Pixmap,
    size: PixelSize,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster").field("size", &self.size).finish()
    }
}

impl PartialEq for Raster {
    fn eq(&self, other: &Self) -> bool {
        self.rgba == other.rgba
    }
}

impl Raster {
    /// Wrap an already decoded image. Returns `None` for zero-sized images.
    pub fn new(rgba: RgbaImage) -> Option<Self> {
        let size = PixelSize::new(rgba.width(), rgba.height())?;
        let pixmap = premultiplied(&rgba)?;
        Some(Self { rgba, pixmap, size })
    }

    /// Decode any image format the `image` crate was built with
    pub fn decode(bytes: &[u8]) -> image::ImageResult<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        Self::new(rgba).ok_or_else(|| {
            image::ImageError::Limits(image::error::LimitError::from_kind(
                image::error::LimitErrorKind::DimensionError,
            ))
        })
    }

    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    /// Premultiplied copy of the pixels, ready for tiny-skia
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

fn premultiplied(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let mut data = img.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a != 255 {
            px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
            px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
            px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size)
}

/// Page rasters in page order. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct PageList {
    first: Raster,
    rest: Vec<Raster>,
}

impl PageList {
    pub fn new(pages: Vec<Raster>) -> Option<Self> {
        let mut pages = pages.into_iter();
        let first = pages.next()?;
        Some(Self {
            first,
            rest: pages.collect(),
        })
    }

    pub fn first(&self) -> &Raster {
        &self.first
    }

    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    pub fn get(&self, index: usize) -> Option<&Raster> {
        match index {
            0 => Some(&self.first),
            n => self.rest.get(n - 1),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Raster> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    pub fn into_vec(self) -> Vec<Raster> {
        let mut pages = Vec::with_capacity(1 + self.rest.len());
        pages.push(self.first);
        pages.extend(self.rest);
        pages
    }
}

/// The background content being annotated
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    /// One raster, e.g. a photo or a scanned page
    SingleImage(Raster),
    /// Pages rasterized from a PDF at a fixed scale
    MultiPagePdf(PageList),
}

impl Document {
    /// Build a multi-page document; `None` if there are no pages
    pub fn multi_page(pages: Vec<Raster>) -> Option<Self> {
        PageList::new(pages).map(Document::MultiPagePdf)
    }

    pub fn page(&self, index: usize) -> Option<&Raster> {
        match self {
            Document::SingleImage(raster) => (index == 0).then_some(raster),
            Document::MultiPagePdf(pages) => pages.get(index),
        }
    }

    pub fn page_count(&self) -> usize {
        match self {
            Document::SingleImage(_) => 1,
            Document::MultiPagePdf(pages) => pages.len(),
        }
    }

    /// The page the interactive editor composes on
    pub fn primary_page(&self) -> &Raster {
        match self {
            Document::SingleImage(raster) => raster,
            Document::MultiPagePdf(pages) => pages.first(),
        }
    }

    /// Pixel size of the primary page
    pub fn size(&self) -> PixelSize {
        self.primary_page().size()
    }

    pub fn into_pages(self) -> Vec<Raster> {
        match self {
            Document::SingleImage(raster) => vec![raster],
            Document::MultiPagePdf(pages) => pages.into_vec(),
        }
    }
}
