use image::RgbImage;
use serde::Serialize;
use std::time::Instant;

use super::estimator::{EstimatorParams, SkewEstimator};
use super::steps;

/// Timing information for a single correction step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of correcting one frame, including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionResult {
    /// Corrected image (not serialized)
    #[serde(skip)]
    pub image: RgbImage,
    /// Applied rotation in degrees
    pub angle: f64,
    /// Lines the angle was aggregated from (0 means no estimate)
    pub line_count: usize,
    /// Total correction time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Estimate-then-rotate pipeline applied to every frame
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    estimator: SkewEstimator,
}

impl Pipeline {
    pub fn new(params: EstimatorParams) -> Self {
        Self {
            estimator: SkewEstimator::new(params),
        }
    }

    /// De-skew one frame. The output has the same dimensions as the input.
    pub fn process(&self, image: RgbImage) -> CorrectionResult {
        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let estimate = self.run_step("estimate", &mut steps_timing, || {
            self.estimator.estimate(&image)
        });

        if estimate.is_undetermined() {
            tracing::debug!("No lines detected, leaving frame unrotated");
        }

        let corrected = self.run_step("rotate", &mut steps_timing, || {
            steps::rotate::apply(&image, estimate.angle)
        });

        let result = CorrectionResult {
            image: corrected,
            angle: estimate.angle,
            line_count: estimate.line_count,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        };

        tracing::debug!(
            angle = result.angle,
            lines = result.line_count,
            time_ms = result.total_time_ms,
            "Frame corrected"
        );

        result
    }

    fn run_step<T, F>(&self, name: &str, timings: &mut Vec<StepTiming>, step_fn: F) -> T
    where
        F: FnOnce() -> T,
    {
        let step_start = Instant::now();
        let result = step_fn();
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        result
    }
}
