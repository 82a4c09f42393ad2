//! Export pipeline
//!
//! This module contains:
//! - PNG encoding of flattened rasters
//! - Local PDF assembly (lopdf)
//! - The remote conversion client (reqwest)
//! - Multi-page stamping export
//! - Atomic file output

pub mod pages;
pub mod pdf;
pub mod remote;

use std::io;
use std::path::Path;

use anyhow::Context;
use image::RgbaImage;

use crate::config::PageSizing;
use crate::domain::PixelSize;
use crate::error::Result;

pub use pages::export_signed_pages;
pub use pdf::{build_pdf, PdfPage};

pub fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_png(&mut bytes, image)?;
    Ok(bytes)
}

/// One full-bleed page holding the flattened export raster
pub fn single_page_pdf(raster: &RgbaImage, document: PixelSize, sizing: PageSizing) -> Result<Vec<u8>> {
    let page = match sizing {
        PageSizing::DocumentPixels => PdfPage {
            image: raster,
            width: document.width() as f32,
            height: document.height() as f32,
        },
        PageSizing::RasterPixels => PdfPage::raster_sized(raster),
    };
    build_pdf(&[page])
}

/// Write `bytes` to `path` through a temp file in the same directory, so a
/// failed write never leaves a truncated file behind.
pub fn save_atomically(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    use std::io::Write;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    file.write_all(bytes).context("writing export")?;
    file.persist(path)
        .with_context(|| format!("saving {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_png_round_trip_dimensions() {
        let img = RgbaImage::from_pixel(7, 5, Rgba([1, 2, 3, 128]));
        let bytes = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_single_page_sizing() {
        let raster = RgbaImage::from_pixel(160, 120, Rgba([0, 0, 0, 255]));
        let doc = PixelSize::new(80, 60).unwrap();
        for (sizing, expected) in [
            (PageSizing::DocumentPixels, 80.0),
            (PageSizing::RasterPixels, 160.0),
        ] {
            let bytes = single_page_pdf(&raster, doc, sizing).unwrap();
            let pdf = lopdf::Document::load_mem(&bytes).unwrap();
            let id = pdf.get_pages()[&1];
            let width = pdf.get_object(id).unwrap().as_dict().unwrap().get(b"MediaBox").unwrap()
                .as_array().unwrap()[2]
                .as_float()
                .unwrap();
            assert_eq!(width, expected);
        }
    }

    #[test]
    fn test_save_atomically_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("signed.pdf");
        save_atomically(&path, b"first").unwrap();
        save_atomically(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}
