//! Skew estimation by edge detection and Hough line voting
//!
//! Edge + line accumulation copes with sparse text and mixed content (tables,
//! figures). The median of the per-line angles keeps a minority of
//! perpendicular or stray lines from dragging the estimate.

use image::RgbImage;
use serde::Serialize;

use super::steps;

/// Canny hysteresis lower bound (0-255 gradient scale)
pub const CANNY_LOW_THRESHOLD: f32 = 50.0;
/// Canny hysteresis upper bound
pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;
/// Minimum accumulator votes for a line to count
pub const HOUGH_VOTE_THRESHOLD: u32 = 200;
/// Non-maximum suppression radius in the accumulator
pub const HOUGH_SUPPRESSION_RADIUS: u32 = 8;
/// Accumulator bin width; fixed by the Hough implementation
pub const ANGULAR_RESOLUTION_DEGREES: f64 = 1.0;

/// Tunable parameters for skew estimation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimatorParams {
    pub canny_low: f32,
    pub canny_high: f32,
    pub vote_threshold: u32,
    pub suppression_radius: u32,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            canny_low: CANNY_LOW_THRESHOLD,
            canny_high: CANNY_HIGH_THRESHOLD,
            vote_threshold: HOUGH_VOTE_THRESHOLD,
            suppression_radius: HOUGH_SUPPRESSION_RADIUS,
        }
    }
}

/// Result of a skew estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewEstimate {
    /// Degrees to rotate (counter-clockwise positive) to level the content
    pub angle: f64,
    /// Number of detected lines the angle was aggregated from
    pub line_count: usize,
}

impl SkewEstimate {
    /// No lines were detected, so the angle is the identity fallback
    pub fn is_undetermined(&self) -> bool {
        self.line_count == 0
    }
}

/// Estimates the rotation needed to level a scanned page
#[derive(Debug, Clone, Default)]
pub struct SkewEstimator {
    params: EstimatorParams,
}

impl SkewEstimator {
    pub fn new(params: EstimatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EstimatorParams {
        &self.params
    }

    /// Estimate skew. Never fails: an image without detectable lines
    /// yields angle 0 with `line_count == 0`.
    pub fn estimate(&self, image: &RgbImage) -> SkewEstimate {
        let gray = steps::grayscale::apply(image);
        let edges = steps::edges::apply(&gray, self.params.canny_low, self.params.canny_high);
        let lines = steps::lines::apply(
            &edges,
            self.params.vote_threshold,
            self.params.suppression_radius,
        );

        let mut angles: Vec<f64> = lines.iter().map(|line| line.skew_degrees()).collect();
        let angle = median(&mut angles).unwrap_or(0.0);

        tracing::debug!(lines = lines.len(), angle, "Skew estimated");

        SkewEstimate {
            angle,
            line_count: lines.len(),
        }
    }

    /// Estimate skew, returning only the angle in degrees
    pub fn estimate_angle(&self, image: &RgbImage) -> f64 {
        self.estimate(image).angle
    }
}

/// Estimate skew with the default parameters
pub fn estimate_angle(image: &RgbImage) -> f64 {
    SkewEstimator::default().estimate_angle(image)
}

/// Median of `values`; an even count averages the two middle values
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
