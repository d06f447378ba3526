use image::{GrayImage, Luma, RgbImage};

/// ITU-R BT.601 luma weights, matching what scanners and most codecs assume
const RED_WEIGHT: f32 = 0.299;
const GREEN_WEIGHT: f32 = 0.587;
const BLUE_WEIGHT: f32 = 0.114;

/// Convert an RGB frame to single-channel luminance
/// This is the foundation for edge detection
pub fn apply(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = RED_WEIGHT * r as f32 + GREEN_WEIGHT * g as f32 + BLUE_WEIGHT * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}
