use image::{Rgb, RgbImage};

/// Cubic convolution coefficient (same kernel as OpenCV's INTER_CUBIC)
const CUBIC_A: f64 = -0.75;

/// Rotate an image about its center by `angle_degrees`.
/// Positive angles turn the content counter-clockwise as displayed.
/// The output keeps the input dimensions; samples that fall outside the
/// source replicate the nearest edge pixel, so no dark borders appear.
pub fn apply(image: &RgbImage, angle_degrees: f64) -> RgbImage {
    let (width, height) = image.dimensions();
    if angle_degrees == 0.0 || width == 0 || height == 0 {
        return image.clone();
    }

    let (sin_a, cos_a) = angle_degrees.to_radians().sin_cos();
    let cx = (width / 2) as f64;
    let cy = (height / 2) as f64;

    // Inverse mapping: for each destination pixel, find where it came from
    RgbImage::from_fn(width, height, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let src_x = cos_a * dx - sin_a * dy + cx;
        let src_y = sin_a * dx + cos_a * dy + cy;
        sample_bicubic(image, src_x, src_y)
    })
}

/// Bicubic sample with edge replication for out-of-range taps
fn sample_bicubic(image: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let (width, height) = image.dimensions();
    let x0 = x.floor();
    let y0 = y.floor();
    let wx = cubic_weights(x - x0);
    let wy = cubic_weights(y - y0);

    let mut acc = [0.0f64; 3];
    for (j, weight_y) in wy.iter().enumerate() {
        let sy = clamp_index(y0 as i64 + j as i64 - 1, height);
        for (i, weight_x) in wx.iter().enumerate() {
            let sx = clamp_index(x0 as i64 + i as i64 - 1, width);
            let weight = weight_x * weight_y;
            for (channel, value) in acc.iter_mut().zip(image.get_pixel(sx, sy).0) {
                *channel += weight * value as f64;
            }
        }
    }

    Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

fn clamp_index(index: i64, len: u32) -> u32 {
    index.clamp(0, len as i64 - 1) as u32
}

/// Weights for the four taps at offsets -1, 0, 1, 2 around a sample
/// with fractional position `t` in [0, 1)
fn cubic_weights(t: f64) -> [f64; 4] {
    let a = CUBIC_A;
    let near = |d: f64| ((a + 2.0) * d - (a + 3.0)) * d * d + 1.0;
    let far = |d: f64| ((a * d - 5.0 * a) * d + 8.0 * a) * d - 4.0 * a;

    let w0 = far(t + 1.0);
    let w1 = near(t);
    let w2 = near(1.0 - t);
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}
