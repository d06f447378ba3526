//! Reassemble corrected pages into a PDF
//!
//! Each PNG page becomes one PDF page holding a single Flate-compressed RGB
//! image XObject that fills the page. Page size is derived from the pixel
//! size at the rasterization DPI, so a page rendered at 300 DPI comes back at
//! its original physical size.

use crate::codec;
use crate::error::DeskewError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::pixels_to_points;

/// Build a PDF with one page per PNG buffer, in order
pub fn assemble(pages: &[Vec<u8>], dpi: u32) -> Result<Vec<u8>, DeskewError> {
    if pages.is_empty() {
        return Err(DeskewError::EncodeError("No pages to assemble".to_string()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for (index, png) in pages.iter().enumerate() {
        let page_id = add_image_page(&mut doc, pages_id, png, dpi).map_err(|e| {
            DeskewError::EncodeError(format!("Failed to add page {}: {}", index + 1, e))
        })?;
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| DeskewError::EncodeError(format!("Failed to serialize PDF: {}", e)))?;

    tracing::debug!(pages = pages.len(), bytes = buffer.len(), "PDF assembled");

    Ok(buffer)
}

fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    png: &[u8],
    dpi: u32,
) -> Result<ObjectId, DeskewError> {
    let rgb = codec::decode_png(png)?;
    let (width, height) = rgb.dimensions();
    let width_pt = pixels_to_points(width, dpi) as f32;
    let height_pt = pixels_to_points(height, dpi) as f32;

    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    );
    let image_id = doc.add_object(image);

    // Scale the unit image square up to the full page
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width_pt),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(height_pt),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| DeskewError::EncodeError(format!("Failed to encode page content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width_pt),
            Object::Real(height_pt),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    });

    Ok(page_id)
}
