//! PDF page rasterization and reassembly
//!
//! Rasterizers implement the [`PageRasterizer`] trait. The native renderer
//! is pure Rust (hayro); the pdftoppm renderer shells out to poppler.

pub mod native;
pub mod pdftoppm;
pub mod writer;

use crate::config::Config;
use crate::error::DeskewError;
use clap::ValueEnum;
use image::RgbImage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Default rasterization resolution
pub const DEFAULT_DPI: u32 = 300;
/// PDF user-space units per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Trait that all page rasterizers must implement
pub trait PageRasterizer: Send + Sync {
    /// Returns the rasterizer identifier (e.g., "native", "pdftoppm")
    fn name(&self) -> &'static str;

    /// Open a PDF for page-by-page rendering
    fn open(&self, path: &Path) -> Result<Box<dyn RasterPages>, DeskewError>;
}

/// An opened PDF whose pages can be rendered in order
pub trait RasterPages {
    fn page_count(&self) -> usize;

    /// Render page `index` (zero-based) as RGB without alpha, sized
    /// `page_size_in_points * dpi / 72`
    fn render(&mut self, index: usize, dpi: u32) -> Result<RgbImage, DeskewError>;
}

/// Available rasterizer backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterizerKind {
    /// Render pages in-process with hayro (no system dependencies)
    #[default]
    Native,
    /// Render pages with poppler's pdftoppm
    Pdftoppm,
}

/// Create the rasterizer selected by the configuration
pub fn build_rasterizer(config: &Config) -> Arc<dyn PageRasterizer> {
    let rasterizer: Arc<dyn PageRasterizer> = match config.rasterizer {
        RasterizerKind::Native => Arc::new(native::NativeRasterizer),
        RasterizerKind::Pdftoppm => {
            Arc::new(pdftoppm::PdftoppmRasterizer::new(config.pdftoppm_path.clone()))
        }
    };
    tracing::debug!("Using {} page rasterizer", rasterizer.name());
    rasterizer
}

/// Pixel length of `points` at `dpi`, never less than one pixel
pub fn points_to_pixels(points: f64, dpi: u32) -> u32 {
    ((points * dpi as f64 / POINTS_PER_INCH).round() as u32).max(1)
}

/// Point length of `pixels` at `dpi`
pub fn pixels_to_points(pixels: u32, dpi: u32) -> f64 {
    pixels as f64 * POINTS_PER_INCH / dpi as f64
}
