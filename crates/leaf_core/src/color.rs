//! Colour conversions used by the feature extractor.
//!
//! HSV uses the 8-bit convention: hue is half the angle in degrees, so it
//! lives in `[0, 180)`, while saturation and value span `[0, 255]`. The
//! classifier was fitted on this scale; switching to a degree-based hue
//! silently changes the feature distribution.

use image::{GrayImage, Luma, RgbImage};

const HSV_SHIFT: i32 = 12;
const HSV_ROUND: i32 = 1 << (HSV_SHIFT - 1);

const GRAY_SHIFT: u32 = 14;
const GRAY_R: u32 = 4899;
const GRAY_G: u32 = 9617;
const GRAY_B: u32 = 1868;

/// Converts one RGB pixel to byte-scaled HSV.
pub fn hsv_pixel([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = if v == 0 {
        0
    } else {
        (diff * scaled_reciprocal(255, v) + HSV_ROUND) >> HSV_SHIFT
    };

    let h = if diff == 0 {
        0
    } else {
        let raw = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let h = (raw * scaled_reciprocal(180, 6 * diff) + HSV_ROUND) >> HSV_SHIFT;
        if h < 0 { h + 180 } else { h }
    };

    [h as u8, s as u8, v as u8]
}

// round(numer * 2^12 / denom)
fn scaled_reciprocal(numer: i32, denom: i32) -> i32 {
    (f64::from(numer << HSV_SHIFT) / f64::from(denom)).round() as i32
}

/// Per-channel mean of the HSV representation, ordered H, S, V.
pub fn mean_hsv(image: &RgbImage) -> [f64; 3] {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return [0.0; 3];
    }
    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        let hsv = hsv_pixel(pixel.0);
        for (sum, channel) in sums.iter_mut().zip(hsv) {
            *sum += u64::from(channel);
        }
    }
    sums.map(|s| s as f64 / count as f64)
}

/// BT.601 luma in 14-bit fixed point.
pub fn grayscale(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let weighted = u32::from(r) * GRAY_R + u32::from(g) * GRAY_G + u32::from(b) * GRAY_B;
        Luma([((weighted + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT) as u8])
    })
}
