use image::GrayImage;
use imageproc::edges::canny;

/// Produce a binary edge map (edge pixels are 255, everything else 0)
/// using Canny hysteresis between `low` and `high` gradient thresholds
pub fn apply(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    canny(gray, low, high)
}
