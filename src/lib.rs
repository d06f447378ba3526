//! Batch skew correction for scanned PNG, JPEG and PDF documents.
//!
//! [`batch::run`] walks an input path, and for each recognized item the
//! [`processor::ItemProcessor`] estimates the skew of every frame, rotates
//! it level and writes a `corrected_*` copy to the output directory.

pub mod batch;
pub mod codec;
pub mod config;
pub mod correction;
pub mod document;
pub mod error;
pub mod pdf;
pub mod processor;

pub use batch::{BatchSummary, ItemFailure};
pub use config::Config;
pub use correction::{estimate_angle, rotate};
pub use error::DeskewError;
pub use processor::{ItemProcessor, OutputArtifact};
