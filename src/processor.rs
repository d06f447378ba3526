//! Per-item processing: decode or rasterize, correct every frame, write the
//! artifact
//!
//! The whole artifact is built in memory and only then written, through a
//! temporary file in the output directory that is renamed into place. A
//! failed or aborted item therefore never leaves a partial file behind.

use crate::codec;
use crate::config::Config;
use crate::correction::Pipeline;
use crate::document::{self, DocumentKind, RasterFormat};
use crate::error::DeskewError;
use crate::pdf::{self, writer, PageRasterizer};
use image::RgbImage;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A corrected file written to the output directory
#[derive(Debug, Clone, Serialize)]
pub struct OutputArtifact {
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: DocumentKind,
    /// Frames written (1 for raster inputs)
    pub pages: usize,
    /// Applied rotation per frame, in page order
    pub angles: Vec<f64>,
}

/// Corrects single items. Shared across workers behind an `Arc`.
pub struct ItemProcessor {
    output_dir: PathBuf,
    dpi: u32,
    jpeg_quality: u8,
    pipeline: Pipeline,
    rasterizer: Arc<dyn PageRasterizer>,
}

impl ItemProcessor {
    pub fn new(config: &Config) -> Self {
        Self::with_rasterizer(config, pdf::build_rasterizer(config))
    }

    /// Use a specific page rasterizer instead of the configured one
    pub fn with_rasterizer(config: &Config, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            dpi: config.dpi,
            jpeg_quality: config.jpeg_quality,
            pipeline: Pipeline::new(config.estimator),
            rasterizer,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Process one input path into its corrected artifact. Logs
    /// `Corrected: <name>` once the artifact is written; failures are left
    /// to the caller to report.
    pub fn process(&self, path: &Path) -> Result<OutputArtifact, DeskewError> {
        self.process_with_abort(path, &AtomicBool::new(false))
    }

    /// Like [`process`](Self::process), but gives up without writing
    /// anything once `abort` is raised
    pub fn process_with_abort(
        &self,
        path: &Path,
        abort: &AtomicBool,
    ) -> Result<OutputArtifact, DeskewError> {
        let kind = DocumentKind::classify(path)
            .ok_or_else(|| DeskewError::UnsupportedFormat(document::display_name(path)))?;
        let output = document::output_path(path, &self.output_dir);

        let (bytes, angles) = match kind {
            DocumentKind::Raster(format) => self.correct_raster(path, format)?,
            DocumentKind::Paged => self.correct_paged(path, abort)?,
        };

        check_abort(abort)?;
        self.persist(&bytes, &output)?;
        tracing::info!("Corrected: {}", document::display_name(path));

        Ok(OutputArtifact {
            input: path.to_path_buf(),
            output,
            kind,
            pages: angles.len(),
            angles,
        })
    }

    fn correct_raster(
        &self,
        path: &Path,
        format: RasterFormat,
    ) -> Result<(Vec<u8>, Vec<f64>), DeskewError> {
        let image = codec::decode_raster(path)?;
        let result = self.pipeline.process(image);
        let bytes = codec::encode(&result.image, format, self.jpeg_quality)?;
        Ok((bytes, vec![result.angle]))
    }

    fn correct_paged(
        &self,
        path: &Path,
        abort: &AtomicBool,
    ) -> Result<(Vec<u8>, Vec<f64>), DeskewError> {
        let mut pages = self.rasterizer.open(path)?;
        let page_count = pages.page_count();
        if page_count == 0 {
            return Err(DeskewError::ReadError("PDF has no pages".to_string()));
        }

        let mut encoded = Vec::with_capacity(page_count);
        let mut angles = Vec::with_capacity(page_count);
        for index in 0..page_count {
            check_abort(abort)?;
            let frame: RgbImage = pages.render(index, self.dpi)?;
            let result = self.pipeline.process(frame);
            tracing::debug!(
                page = index + 1,
                of = page_count,
                angle = result.angle,
                "Page corrected"
            );
            angles.push(result.angle);
            encoded.push(codec::encode_png(&result.image)?);
        }

        let bytes = writer::assemble(&encoded, self.dpi)?;
        Ok((bytes, angles))
    }

    /// Write `bytes` to `output` via a renamed temporary file
    fn persist(&self, bytes: &[u8], output: &Path) -> Result<(), DeskewError> {
        let mut file = tempfile::NamedTempFile::new_in(&self.output_dir)
            .map_err(|e| DeskewError::WriteError(format!("Failed to create temp file: {}", e)))?;
        file.write_all(bytes)
            .map_err(|e| DeskewError::WriteError(format!("Failed to write output: {}", e)))?;
        file.persist(output).map_err(|e| {
            DeskewError::WriteError(format!("Failed to save {}: {}", output.display(), e.error))
        })?;
        Ok(())
    }
}

fn check_abort(abort: &AtomicBool) -> Result<(), DeskewError> {
    if abort.load(Ordering::SeqCst) {
        Err(DeskewError::Internal("processing aborted".to_string()))
    } else {
        Ok(())
    }
}
