//! Input classification and output naming

use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Prefix added to every output file name
pub const OUTPUT_PREFIX: &str = "corrected_";

/// Codec of a single-frame raster input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// What kind of document an input path holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// One frame (PNG or JPEG)
    Raster(RasterFormat),
    /// One frame per PDF page
    Paged,
}

impl DocumentKind {
    /// Classify by extension, case-insensitively. `None` means the path is
    /// not something this tool processes.
    pub fn classify(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Raster(RasterFormat::Jpeg)),
            "png" => Some(Self::Raster(RasterFormat::Png)),
            "pdf" => Some(Self::Paged),
            _ => None,
        }
    }
}

/// Name used when reporting on a path. Never fails.
pub fn display_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.display().to_string(),
    }
}

/// `corrected_<stem><ext>`; raster extensions are kept verbatim, PDFs always
/// end in `.pdf`
pub fn output_file_name(path: &Path) -> OsString {
    let mut name = OsString::from(OUTPUT_PREFIX);
    if let Some(stem) = path.file_stem() {
        name.push(stem);
    }
    match (DocumentKind::classify(path), path.extension()) {
        (Some(DocumentKind::Paged), _) => name.push(".pdf"),
        (_, Some(ext)) => {
            name.push(".");
            name.push(ext);
        }
        (_, None) => {}
    }
    name
}

/// Full output path for `input` under `output_dir`
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(output_file_name(input))
}
