//! Error types for feature extraction and classification.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning an image into a feature vector.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("cannot decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot decode image bytes: {0}")]
    DecodeBytes(#[source] image::ImageError),
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Failures while loading or evaluating the classifier model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file missing: {}", .0.display())]
    Missing(PathBuf),
    #[error("cannot read model {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse model {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid model: {0}")]
    Invalid(String),
    #[error("feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Any failure of a single analysis action.
#[derive(Debug, Error)]
pub enum LeafError {
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Model(#[from] ModelError),
}
