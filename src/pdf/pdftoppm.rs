//! Rasterizer backed by poppler's `pdftoppm`
//!
//! Handles any page content, including vector text. Requires the
//! `pdftoppm` executable at runtime.

use crate::error::DeskewError;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{PageRasterizer, RasterPages};

/// Default executable name, resolved through `PATH`
pub const DEFAULT_PROGRAM: &str = "pdftoppm";

#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn name(&self) -> &'static str {
        "pdftoppm"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn RasterPages>, DeskewError> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| DeskewError::ReadError(format!("Failed to load PDF: {}", e)))?;
        let scratch = tempfile::tempdir()
            .map_err(|e| DeskewError::Internal(format!("Failed to create scratch dir: {}", e)))?;

        Ok(Box::new(PdftoppmPages {
            program: self.program.clone(),
            pdf: path.to_path_buf(),
            page_count: doc.get_pages().len(),
            scratch,
        }))
    }
}

struct PdftoppmPages {
    program: PathBuf,
    pdf: PathBuf,
    page_count: usize,
    scratch: tempfile::TempDir,
}

impl RasterPages for PdftoppmPages {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render(&mut self, index: usize, dpi: u32) -> Result<RgbImage, DeskewError> {
        if index >= self.page_count {
            return Err(DeskewError::page(index, "page index out of range"));
        }

        let page_number = (index + 1).to_string();
        let prefix = self.scratch.path().join("page");

        let output = Command::new(&self.program)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-png")
            .arg("-singlefile")
            .arg(&self.pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                DeskewError::page(
                    index,
                    format!("failed to run {}: {}", self.program.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeskewError::page(index, stderr.trim().to_string()));
        }

        let rendered = prefix.with_extension("png");
        let image = image::open(&rendered)
            .map_err(|e| DeskewError::page(index, format!("unreadable render: {}", e)))?
            .into_rgb8();
        // The scratch dir is removed on drop anyway
        if let Err(e) = std::fs::remove_file(&rendered) {
            tracing::debug!("Failed to remove {}: {}", rendered.display(), e);
        }

        Ok(image)
    }
}
