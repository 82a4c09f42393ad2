//! Multi-page export: stamp each page, then one PDF page per source page

use image::RgbaImage;

use super::pdf::{build_pdf, PdfPage};
use crate::domain::{Raster, Rect};
use crate::error::Result;
use crate::render::image::{draw_raster_in_rect, rgba_from_pixmap};
use crate::session::PageSigner;

/// Composite `stamp` into every rect of a page copy
pub fn flatten_page(page: &Raster, stamp: &Raster, rects: impl IntoIterator<Item = Rect>) -> RgbaImage {
    let mut surface = page.pixmap().clone();
    for rect in rects {
        draw_raster_in_rect(&mut surface, stamp, rect);
    }
    rgba_from_pixmap(&surface)
}

/// Flatten every page with its stamps and build the signed PDF.
///
/// Pages without stamps are embedded unchanged. Any failure aborts the
/// whole export.
pub fn export_signed_pages(signer: &PageSigner) -> Result<Vec<u8>> {
    let mut flattened: Vec<Option<RgbaImage>> = Vec::with_capacity(signer.page_count());
    for (index, page) in signer.pages().iter().enumerate() {
        let stamped = match signer.signature() {
            Some(stamp) if !signer.placements(index).is_empty() => {
                Some(flatten_page(page, stamp, signer.stamp_rects(index)))
            }
            _ => None,
        };
        flattened.push(stamped);
    }

    let pages: Vec<PdfPage<'_>> = signer
        .pages()
        .iter()
        .zip(&flattened)
        .map(|(original, stamped)| {
            PdfPage::raster_sized(stamped.as_ref().unwrap_or_else(|| original.as_rgba()))
        })
        .collect();
    log::info!("Exporting {} signed pages", pages.len());
    build_pdf(&pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PageList, Point};
    use crate::session::StampSize;
    use image::Rgba;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Raster {
        Raster::new(RgbaImage::from_pixel(w, h, Rgba(rgba))).unwrap()
    }

    #[test]
    fn test_stamp_is_stretched_to_rect() {
        let page = solid(400, 300, [255, 255, 255, 255]);
        let stamp = solid(300, 120, [0, 0, 0, 255]);
        let out = flatten_page(&page, &stamp, [Rect::new(10.0, 20.0, 160.0, 100.0)]);
        assert_eq!(out.get_pixel(80, 60).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(170, 60).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(80, 110).0, [255, 255, 255, 255]);
        // Source page untouched
        assert_eq!(page.as_rgba().get_pixel(80, 60).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_signed_pdf_keeps_page_order_and_sizes() {
        let pages = PageList::new(vec![
            solid(300, 400, [255, 255, 255, 255]),
            solid(500, 200, [255, 255, 255, 255]),
            solid(100, 100, [255, 255, 255, 255]),
        ])
        .unwrap();
        let mut signer = PageSigner::new(
            pages,
            StampSize {
                width: 150.0,
                height: 80.0,
            },
        );
        signer.set_signature(Some(solid(300, 120, [0, 0, 0, 255])));
        signer.place_signature(1, Point::new(20.0, 20.0));

        let bytes = export_signed_pages(&signer).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let ids = doc.get_pages();
        assert_eq!(ids.len(), 3);
        let widths: Vec<f32> = ids
            .values()
            .map(|id| {
                let page = doc.get_object(*id).unwrap().as_dict().unwrap();
                page.get(b"MediaBox").unwrap().as_array().unwrap()[2]
                    .as_float()
                    .unwrap()
            })
            .collect();
        assert_eq!(widths, vec![300.0, 500.0, 100.0]);
    }
}
