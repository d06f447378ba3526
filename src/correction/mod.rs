//! Skew estimation and rotation correction for raster frames

pub mod estimator;
pub mod pipeline;
pub mod steps;

pub use estimator::{estimate_angle, EstimatorParams, SkewEstimate, SkewEstimator};
pub use pipeline::{CorrectionResult, Pipeline, StepTiming};
pub use steps::lines::LineCandidate;
pub use steps::rotate::apply as rotate;
