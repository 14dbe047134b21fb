//! Image to feature-vector transform.
//!
//! Every image is squashed to 200x200 (aspect ratio is not preserved) before
//! any statistic is taken, so the output never depends on source resolution.

use crate::color::{grayscale, mean_hsv};
use crate::edges::canny;
use crate::error::{FeatureError, ModelError};
use crate::glcm::Glcm;
use image::{
    DynamicImage, GrayImage, ImageError, ImageReader, RgbImage, imageops::FilterType,
};
use imageproc::filter::separable_filter_equal;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const NORMALIZED_SIZE: u32 = 200;
pub const FEATURE_COUNT: usize = 5;
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "mean_hue",
    "mean_saturation",
    "mean_value",
    "edge_density",
    "contrast",
];

pub const CANNY_LOW: f32 = 100.0;
pub const CANNY_HIGH: f32 = 200.0;

/// Fixed 7-tap kernel used for a 7x7 Gaussian blur with sigma left at its
/// default.
pub const GAUSSIAN_7: [f32; 7] = [
    0.031_25, 0.109_375, 0.218_75, 0.281_25, 0.218_75, 0.109_375, 0.031_25,
];

const PIXEL_COUNT: f64 = (NORMALIZED_SIZE * NORMALIZED_SIZE) as f64;

/// The five numbers the classifier was fitted on, in model order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Mean hue on the `[0, 180)` byte scale.
    pub mean_hue: f64,
    pub mean_saturation: f64,
    pub mean_value: f64,
    /// Sum of the 0/255 Canny edge map divided by the pixel count.
    pub edge_density: f64,
    /// GLCM contrast of the blurred grayscale image.
    pub contrast: f64,
}

impl FeatureVector {
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.mean_hue,
            self.mean_saturation,
            self.mean_value,
            self.edge_density,
            self.contrast,
        ]
    }

    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [mean_hue, mean_saturation, mean_value, edge_density, contrast] = values;
        Self {
            mean_hue,
            mean_saturation,
            mean_value,
            edge_density,
            contrast,
        }
    }

    /// Builds a vector from raw values, rejecting anything but exactly five.
    pub fn from_slice(values: &[f64]) -> Result<Self, ModelError> {
        let array: [f64; FEATURE_COUNT] =
            values.try_into().map_err(|_| ModelError::DimensionMismatch {
                expected: FEATURE_COUNT,
                actual: values.len(),
            })?;
        Ok(Self::from_array(array))
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Decodes the file at `path` and extracts its feature vector.
pub fn extract_features(path: impl AsRef<Path>) -> Result<FeatureVector, FeatureError> {
    let path = path.as_ref();
    // sniff the header so a mislabelled extension still decodes
    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ImageError::IoError)
        .and_then(|reader| reader.decode())
        .map_err(|source| FeatureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    extract_from_image(&img)
}

/// Same as [`extract_features`] for an encoded image already in memory.
pub fn extract_features_from_bytes(bytes: &[u8]) -> Result<FeatureVector, FeatureError> {
    let img = image::load_from_memory(bytes).map_err(FeatureError::DecodeBytes)?;
    extract_from_image(&img)
}

/// Extracts features from a decoded image.
pub fn extract_from_image(img: &DynamicImage) -> Result<FeatureVector, FeatureError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(FeatureError::EmptyImage {
            width: img.width(),
            height: img.height(),
        });
    }

    let normalized = normalize(img);
    let [mean_hue, mean_saturation, mean_value] = mean_hsv(&normalized);

    let gray = grayscale(&normalized);
    // edges come from the unblurred image, contrast from the blurred one
    let edge_density = edge_density(&gray);
    let blurred = gaussian_blur_7(&gray);
    let contrast = Glcm::horizontal(&blurred).contrast();

    let features = FeatureVector {
        mean_hue,
        mean_saturation,
        mean_value,
        edge_density,
        contrast,
    };
    tracing::debug!(
        source_width = img.width(),
        source_height = img.height(),
        ?features,
        "extracted leaf features"
    );
    Ok(features)
}

fn normalize(img: &DynamicImage) -> RgbImage {
    img.resize_exact(NORMALIZED_SIZE, NORMALIZED_SIZE, FilterType::Triangle)
        .to_rgb8()
}

fn edge_density(gray: &GrayImage) -> f64 {
    let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
    let sum: u64 = edges.as_raw().iter().map(|&v| u64::from(v)).sum();
    sum as f64 / PIXEL_COUNT
}

fn gaussian_blur_7(gray: &GrayImage) -> GrayImage {
    separable_filter_equal(gray, &GAUSSIAN_7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{Luma, Rgb};

    #[test]
    fn gaussian_kernel_is_normalized() {
        assert_relative_eq!(GAUSSIAN_7.iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn blur_keeps_uniform_image_uniform() {
        let gray = GrayImage::from_pixel(20, 20, Luma([90]));
        let blurred = gaussian_blur_7(&gray);
        assert!(blurred.pixels().all(|p| p.0[0] == 90));
    }

    #[test]
    fn blur_softens_a_step() {
        let gray = GrayImage::from_fn(20, 4, |x, _| Luma([if x < 10 { 0 } else { 255 }]));
        let blurred = gaussian_blur_7(&gray);
        let left = blurred.get_pixel(9, 1).0[0];
        let right = blurred.get_pixel(10, 1).0[0];
        assert!(left > 0 && left < 255);
        assert!(right > left && right < 255);
    }

    #[test]
    fn fine_stripes_are_not_smoothed_away() {
        // 3 px stripes stay visible to Canny because no smoothing precedes it
        let gray = GrayImage::from_fn(NORMALIZED_SIZE, NORMALIZED_SIZE, |x, _| {
            Luma([if (x / 3) % 2 == 0 { 0 } else { 255 }])
        });
        assert!(edge_density(&gray) > 40.0, "density {}", edge_density(&gray));
    }

    #[test]
    fn one_pixel_line_gives_two_edge_columns() {
        let gray = GrayImage::from_fn(NORMALIZED_SIZE, NORMALIZED_SIZE, |x, _| {
            Luma([if x == 100 { 255 } else { 0 }])
        });
        assert_relative_eq!(edge_density(&gray), 2.0 * 200.0 * 255.0 / PIXEL_COUNT);
    }

    #[test]
    fn normalize_ignores_aspect_ratio() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 90, Rgb([1, 2, 3])));
        let normalized = normalize(&img);
        assert_eq!(normalized.dimensions(), (NORMALIZED_SIZE, NORMALIZED_SIZE));
    }

    #[test]
    fn empty_image_is_rejected() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let err = extract_from_image(&img).unwrap_err();
        assert!(matches!(err, FeatureError::EmptyImage { width: 0, height: 0 }));
    }

    #[test]
    fn vector_order_follows_feature_names() {
        let v = FeatureVector::from_array([1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(v.mean_hue, 1.0);
        assert_eq!(v.mean_saturation, 2.0);
        assert_eq!(v.mean_value, 3.0);
        assert_eq!(v.edge_density, 4.0);
        assert_eq!(v.contrast, 5.0);
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(FeatureVector::from_slice(&[0.0; 5]).is_ok());
        let err = FeatureVector::from_slice(&[0.0; 4]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch {
                expected: 5,
                actual: 4
            }
        ));
    }

    #[test]
    fn bytes_that_are_not_an_image_fail_to_decode() {
        let err = extract_features_from_bytes(b"definitely not a png").unwrap_err();
        assert!(matches!(err, FeatureError::DecodeBytes(_)));
    }
}
