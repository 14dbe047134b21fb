//! Leaf health classification.
//!
//! An image is reduced to five numbers (mean hue, saturation and value, edge
//! density, GLCM contrast) which a pretrained binary classifier scores as
//! healthy or unhealthy.

pub mod classifier;
pub mod color;
pub mod config;
pub mod context;
pub mod edges;
pub mod error;
pub mod features;
pub mod glcm;
pub mod report;
pub mod scan;

pub use classifier::{
    ClassProbabilities, Classification, Estimator, Health, Kernel, LeafClassifier, LogisticModel,
    ModelArtifact, StandardScaler, SvcModel,
};
pub use config::{AppConfig, ClassifierConfig};
pub use context::AppContext;
pub use error::{FeatureError, LeafError, ModelError};
pub use features::{
    FEATURE_COUNT, FEATURE_NAMES, FeatureVector, NORMALIZED_SIZE, extract_features,
    extract_features_from_bytes, extract_from_image,
};
pub use report::LeafReport;
pub use scan::{ImageInfo, ScanOptions, export_csv, scan_folder, scan_folder_with};
