//! Pure-Rust page renderer backed by `hayro`
//!
//! Renders the full page content (vector paths, text and every image
//! encoding hayro decodes) at `dpi / 72` scale. No system dependencies.

use crate::error::DeskewError;
use hayro::{InterpreterSettings, Pdf, RenderSettings};
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;

use super::{PageRasterizer, RasterPages, POINTS_PER_INCH};

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRasterizer;

impl PageRasterizer for NativeRasterizer {
    fn name(&self) -> &'static str {
        "native"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn RasterPages>, DeskewError> {
        let data = std::fs::read(path)
            .map_err(|e| DeskewError::ReadError(format!("Failed to read PDF: {}", e)))?;
        let pdf = Pdf::new(Arc::new(data))
            .map_err(|e| DeskewError::ReadError(format!("Failed to parse PDF: {:?}", e)))?;
        let page_count = pdf.pages().len();

        Ok(Box::new(NativePages { pdf, page_count }))
    }
}

struct NativePages {
    pdf: Pdf,
    page_count: usize,
}

impl RasterPages for NativePages {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render(&mut self, index: usize, dpi: u32) -> Result<RgbImage, DeskewError> {
        let pages = self.pdf.pages();
        let page = pages
            .get(index)
            .ok_or_else(|| DeskewError::page(index, "page index out of range"))?;

        let scale = (dpi as f64 / POINTS_PER_INCH) as f32;
        let settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            ..Default::default()
        };
        let pixmap = hayro::render(page, &InterpreterSettings::default(), &settings);

        let (width, height) = (u32::from(pixmap.width()), u32::from(pixmap.height()));
        let rgb = flatten_on_white(pixmap.data_as_u8_slice());
        let image = RgbImage::from_raw(width, height, rgb)
            .ok_or_else(|| DeskewError::page(index, "rendered pixmap has unexpected size"))?;

        tracing::debug!(page = index + 1, width, height, "Page rendered");

        Ok(image)
    }
}

/// Composite premultiplied RGBA onto a white page and drop alpha.
/// Areas the page content never paints come out white, as on paper.
fn flatten_on_white(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let paper = 255 - px[3];
        rgb.extend(px[..3].iter().map(|c| c.saturating_add(paper)));
    }
    rgb
}
