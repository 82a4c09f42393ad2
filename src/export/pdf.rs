//! Local PDF assembly
//!
//! Every page is one full-bleed image. RGB goes into a FlateDecode image
//! XObject; translucent rasters get a DeviceGray soft mask next to it.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::{EditorError, Result};

const IMAGE_NAME: &str = "Im0";

/// One output page: the raster and the page size in points
#[derive(Debug, Clone, Copy)]
pub struct PdfPage<'a> {
    pub image: &'a RgbaImage,
    pub width: f32,
    pub height: f32,
}

impl<'a> PdfPage<'a> {
    /// Page sized one point per raster pixel
    pub fn raster_sized(image: &'a RgbaImage) -> Self {
        Self {
            image,
            width: image.width() as f32,
            height: image.height() as f32,
        }
    }
}

/// Build a PDF with one page per entry, in order
pub fn build_pdf(pages: &[PdfPage<'_>]) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(EditorError::conversion("no pages to write"));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let page_id = add_page(&mut doc, pages_id, page)?;
        kids.push(Object::Reference(page_id));
    }

    doc.set_object(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        },
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|err| EditorError::conversion(format!("writing PDF: {err}")))?;
    log::info!("Built PDF with {} pages ({} bytes)", pages.len(), buffer.len());
    Ok(buffer)
}

fn add_page(doc: &mut Document, parent: ObjectId, page: &PdfPage<'_>) -> Result<ObjectId> {
    if !(page.width.is_finite() && page.height.is_finite() && page.width > 0.0 && page.height > 0.0)
    {
        return Err(EditorError::conversion(format!(
            "invalid page size {}x{}",
            page.width, page.height
        )));
    }

    let image_id = add_image(doc, page.image)?;

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page.width.into(),
                    Object::Integer(0),
                    Object::Integer(0),
                    page.height.into(),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            page.width.into(),
            page.height.into(),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                IMAGE_NAME => image_id,
            },
        },
        "Contents" => content_id,
    }))
}

fn add_image(doc: &mut Document, image: &RgbaImage) -> Result<ObjectId> {
    let (width, height) = image.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in image.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
    }

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    if alpha.iter().any(|&a| a != u8::MAX) {
        let smask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(&alpha)?,
        ));
        image_dict.set("SMask", smask_id);
    }

    Ok(doc.add_object(Stream::new(image_dict, deflate(&rgb)?)))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let compress_err = |err: std::io::Error| EditorError::conversion(format!("compressing image: {err}"));
    encoder.write_all(data).map_err(compress_err)?;
    encoder.finish().map_err(compress_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn media_box(doc: &Document, page_id: ObjectId) -> Vec<f32> {
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        page.get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect()
    }

    #[test]
    fn test_one_page_per_raster_in_order() {
        let a = RgbaImage::from_pixel(40, 30, Rgba([255, 0, 0, 255]));
        let b = RgbaImage::from_pixel(20, 50, Rgba([0, 0, 255, 255]));
        let bytes = build_pdf(&[PdfPage::raster_sized(&a), PdfPage::raster_sized(&b)]).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(media_box(&doc, pages[&1]), vec![0.0, 0.0, 40.0, 30.0]);
        assert_eq!(media_box(&doc, pages[&2]), vec![0.0, 0.0, 20.0, 50.0]);
    }

    #[test]
    fn test_page_size_independent_of_raster() {
        let img = RgbaImage::from_pixel(160, 120, Rgba([1, 2, 3, 255]));
        let bytes = build_pdf(&[PdfPage {
            image: &img,
            width: 80.0,
            height: 60.0,
        }])
        .unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(media_box(&doc, pages[&1]), vec![0.0, 0.0, 80.0, 60.0]);
    }

    #[test]
    fn test_empty_and_invalid_pages_rejected() {
        assert!(matches!(
            build_pdf(&[]),
            Err(EditorError::Conversion { .. })
        ));
        let img = RgbaImage::new(1, 1);
        assert!(build_pdf(&[PdfPage {
            image: &img,
            width: 0.0,
            height: 10.0,
        }])
        .is_err());
    }
}
