use crate::codec::DEFAULT_JPEG_QUALITY;
use crate::correction::estimator::{
    EstimatorParams, CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD, HOUGH_SUPPRESSION_RADIUS,
    HOUGH_VOTE_THRESHOLD,
};
use crate::pdf::{pdftoppm, RasterizerKind, DEFAULT_DPI};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "scan-deskew")]
#[command(about = "Straighten skewed scans in PNG, JPEG and PDF files")]
#[command(version)]
pub struct Args {
    /// File or directory to process (directories are walked recursively)
    #[arg(long, short, env = "DESKEW_INPUT", default_value = "inputs")]
    pub input: PathBuf,

    /// Directory that receives the corrected_* outputs
    #[arg(long, short, env = "DESKEW_OUTPUT", default_value = "outputs")]
    pub output: PathBuf,

    /// Resolution used to rasterize PDF pages
    #[arg(long, env = "DESKEW_DPI", default_value_t = DEFAULT_DPI)]
    pub dpi: u32,

    /// PDF page rasterizer
    #[arg(long, env = "DESKEW_RASTERIZER", value_enum, default_value_t = RasterizerKind::Native)]
    pub rasterizer: RasterizerKind,

    /// pdftoppm executable (only used with --rasterizer pdftoppm)
    #[arg(long, env = "DESKEW_PDFTOPPM", default_value = pdftoppm::DEFAULT_PROGRAM)]
    pub pdftoppm_path: PathBuf,

    /// Number of items processed concurrently
    #[arg(long, short, env = "DESKEW_JOBS", default_value_t = 1)]
    pub jobs: usize,

    /// Give up on an item after this many seconds (0 disables the limit)
    #[arg(long, env = "DESKEW_ITEM_TIMEOUT", default_value_t = 0)]
    pub item_timeout_secs: u64,

    /// Quality for corrected JPEG outputs
    #[arg(long, env = "DESKEW_JPEG_QUALITY", default_value_t = DEFAULT_JPEG_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,

    /// Canny lower hysteresis threshold
    #[arg(long, default_value_t = CANNY_LOW_THRESHOLD)]
    pub canny_low: f32,

    /// Canny upper hysteresis threshold
    #[arg(long, default_value_t = CANNY_HIGH_THRESHOLD)]
    pub canny_high: f32,

    /// Minimum Hough votes for a line
    #[arg(long, default_value_t = HOUGH_VOTE_THRESHOLD)]
    pub vote_threshold: u32,

    /// Hough non-maximum suppression radius
    #[arg(long, default_value_t = HOUGH_SUPPRESSION_RADIUS)]
    pub suppression_radius: u32,

    /// Write a JSON summary of the run to this path
    #[arg(long, env = "DESKEW_REPORT")]
    pub report: Option<PathBuf>,

    /// List what would be processed without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Batch configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub dpi: u32,
    pub rasterizer: RasterizerKind,
    pub pdftoppm_path: PathBuf,
    pub jobs: usize,
    pub item_timeout: Option<Duration>,
    pub jpeg_quality: u8,
    pub estimator: EstimatorParams,
    pub report_path: Option<PathBuf>,
    pub dry_run: bool,
}

impl Config {
    /// Defaults for everything except the two paths
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            dpi: DEFAULT_DPI,
            rasterizer: RasterizerKind::default(),
            pdftoppm_path: PathBuf::from(pdftoppm::DEFAULT_PROGRAM),
            jobs: 1,
            item_timeout: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            estimator: EstimatorParams::default(),
            report_path: None,
            dry_run: false,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            input_path: args.input,
            output_dir: args.output,
            dpi: args.dpi.max(1),
            rasterizer: args.rasterizer,
            pdftoppm_path: args.pdftoppm_path,
            jobs: args.jobs.max(1),
            item_timeout: (args.item_timeout_secs > 0)
                .then(|| Duration::from_secs(args.item_timeout_secs)),
            jpeg_quality: args.jpeg_quality,
            estimator: EstimatorParams {
                canny_low: args.canny_low,
                canny_high: args.canny_high,
                vote_threshold: args.vote_threshold,
                suppression_radius: args.suppression_radius,
            },
            report_path: args.report,
            dry_run: args.dry_run,
        }
    }
}
