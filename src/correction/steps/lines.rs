use image::GrayImage;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

/// A straight-line hypothesis from the Hough accumulator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineCandidate {
    /// Signed distance from the image origin, in pixels
    pub distance: f32,
    /// Angle of the line normal in whole degrees, in [0, 180)
    pub theta_degrees: u32,
}

impl LineCandidate {
    /// Rotation that would make this line horizontal.
    /// A horizontal line has its normal at 90°, so it maps to 0.
    pub fn skew_degrees(&self) -> f64 {
        self.theta_degrees as f64 - 90.0
    }
}

impl From<PolarLine> for LineCandidate {
    fn from(line: PolarLine) -> Self {
        Self {
            distance: line.r,
            theta_degrees: line.angle_in_degrees,
        }
    }
}

/// Detect straight lines in a binary edge map.
/// The accumulator works at 1° angular resolution; only lines with at least
/// `vote_threshold` supporting edge pixels are returned.
pub fn apply(edges: &GrayImage, vote_threshold: u32, suppression_radius: u32) -> Vec<LineCandidate> {
    let options = LineDetectionOptions {
        vote_threshold,
        suppression_radius,
    };
    detect_lines(edges, options)
        .into_iter()
        .map(LineCandidate::from)
        .collect()
}
