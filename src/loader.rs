//! Document and signature loading
//!
//! Everything here is blocking and runs on a `spawn_blocking` worker. Results
//! are stamped with a [`LoadTicket`] so the editor can drop any load that was
//! superseded while it was in flight.

use std::path::PathBuf;

use base64::Engine;

use crate::domain::{Document, Raster};
use crate::error::{EditorError, Result};

/// Magic bytes at the start of every PDF file
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Bytes to load, either already in memory or on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceData {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl SourceData {
    pub fn read(self) -> Result<Vec<u8>> {
        match self {
            SourceData::Path(path) => std::fs::read(&path).map_err(|err| {
                EditorError::load("file", format!("{}: {err}", path.display()))
            }),
            SourceData::Bytes(bytes) => Ok(bytes),
        }
    }
}

impl From<PathBuf> for SourceData {
    fn from(path: PathBuf) -> Self {
        SourceData::Path(path)
    }
}

impl From<Vec<u8>> for SourceData {
    fn from(bytes: Vec<u8>) -> Self {
        SourceData::Bytes(bytes)
    }
}

/// Which signature source a load feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureSlot {
    /// Output of the drawing pad
    Drawn,
    /// A user-supplied image file
    Uploaded,
}

/// Signature image as handed over by the outside world
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureInput {
    /// `data:image/png;base64,...` from a drawing pad
    DataUrl(String),
    /// Encoded image bytes (PNG, JPEG, ...)
    Data(SourceData),
}

/// Slots that can have a load in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadSlot {
    Document,
    Signature(SignatureSlot),
}

/// Identifies one requested load; only the newest ticket per slot is current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub slot: LoadSlot,
    generation: u64,
}

/// Per-slot generation counters
#[derive(Debug, Default)]
pub struct LoadTracker {
    document: u64,
    drawn: u64,
    uploaded: u64,
}

impl LoadTracker {
    fn counter(&mut self, slot: LoadSlot) -> &mut u64 {
        match slot {
            LoadSlot::Document => &mut self.document,
            LoadSlot::Signature(SignatureSlot::Drawn) => &mut self.drawn,
            LoadSlot::Signature(SignatureSlot::Uploaded) => &mut self.uploaded,
        }
    }

    /// Start a new load for `slot`, superseding any earlier one
    pub fn begin(&mut self, slot: LoadSlot) -> LoadTicket {
        let counter = self.counter(slot);
        *counter += 1;
        LoadTicket {
            slot,
            generation: *counter,
        }
    }

    /// Invalidate whatever is in flight for `slot` without starting a load
    pub fn invalidate(&mut self, slot: LoadSlot) {
        *self.counter(slot) += 1;
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        let current = match ticket.slot {
            LoadSlot::Document => self.document,
            LoadSlot::Signature(SignatureSlot::Drawn) => self.drawn,
            LoadSlot::Signature(SignatureSlot::Uploaded) => self.uploaded,
        };
        current == ticket.generation
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Decode a base64 data URL into a raster
pub fn decode_data_url(url: &str) -> Result<Raster> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| EditorError::load("signature", "data URL has no payload"))?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(EditorError::load(
            "signature",
            "only base64 data URLs are supported",
        ));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| EditorError::load("signature", err))?;
    Raster::decode(&bytes).map_err(|err| EditorError::load("signature", err))
}

pub fn load_signature(input: SignatureInput) -> Result<Raster> {
    match input {
        SignatureInput::DataUrl(url) => decode_data_url(&url),
        SignatureInput::Data(source) => {
            let bytes = source.read()?;
            Raster::decode(&bytes).map_err(|err| EditorError::load("signature", err))
        }
    }
}

/// Load a document, detecting PDFs by their magic bytes
pub fn load_document(source: SourceData, pdf_render_scale: f32) -> Result<Document> {
    let bytes = source.read()?;
    if is_pdf(&bytes) {
        let pages = rasterize_pdf(&bytes, pdf_render_scale)?;
        log::info!("Loaded PDF with {} pages", pages.len());
        return Document::multi_page(pages)
            .ok_or_else(|| EditorError::load("document", "PDF has no pages"));
    }
    let raster = Raster::decode(&bytes).map_err(|err| EditorError::load("document", err))?;
    log::info!("Loaded image {}x{}", raster.width(), raster.height());
    Ok(Document::SingleImage(raster))
}

#[cfg(feature = "pdf")]
pub fn rasterize_pdf(bytes: &[u8], scale: f32) -> Result<Vec<Raster>> {
    use std::io::Write;

    use mupdf::{Colorspace, Matrix};

    let pdf_err = |err: mupdf::error::Error| EditorError::load("document", err);

    // mupdf opens by path
    let mut file = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|err| EditorError::load("document", err))?;
    file.write_all(bytes)
        .map_err(|err| EditorError::load("document", err))?;

    let doc = mupdf::Document::open(file.path().to_string_lossy().as_ref()).map_err(pdf_err)?;
    let page_count = doc.page_count().map_err(pdf_err)?;
    let matrix = Matrix::new_scale(scale, scale);
    let rgb = Colorspace::device_rgb();

    let mut pages = Vec::with_capacity(page_count.max(0) as usize);
    for index in 0..page_count {
        let page = doc.load_page(index).map_err(pdf_err)?;
        let pixmap = page.to_pixmap(&matrix, &rgb, false, false).map_err(pdf_err)?;
        pages.push(pixmap_to_raster(&pixmap)?);
        log::debug!("Rasterized page {} of {}", index + 1, page_count);
    }
    Ok(pages)
}

#[cfg(feature = "pdf")]
fn pixmap_to_raster(pixmap: &mupdf::Pixmap) -> Result<Raster> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(EditorError::load(
            "document",
            format!("unsupported pixmap format: {n} channels"),
        ));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(EditorError::load("document", "pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row_start = y * stride;
        for px in samples[row_start..row_start + row_bytes].chunks_exact(n) {
            out.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
    }

    image::RgbaImage::from_raw(width as u32, height as u32, out)
        .and_then(Raster::new)
        .ok_or_else(|| EditorError::load("document", "empty PDF page"))
}

#[cfg(not(feature = "pdf"))]
pub fn rasterize_pdf(_bytes: &[u8], _scale: f32) -> Result<Vec<Raster>> {
    Err(EditorError::load(
        "document",
        "PDF support is not enabled in this build; rebuild with the `pdf` feature",
    ))
}
