//! Application context owning the loaded classifier.

use crate::classifier::LeafClassifier;
use crate::config::ClassifierConfig;
use crate::error::{LeafError, ModelError};
use crate::features::extract_features;
use crate::report::LeafReport;
use crate::scan::ImageInfo;
use std::path::Path;

/// Created once at startup; the classifier is never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppContext {
    classifier: LeafClassifier,
}

impl AppContext {
    pub fn new(classifier: LeafClassifier) -> Self {
        Self { classifier }
    }

    /// Loads the model named by `cfg`. Callers treat failure as fatal.
    pub fn from_config(cfg: &ClassifierConfig) -> Result<Self, ModelError> {
        Ok(Self::new(LeafClassifier::from_config(cfg)?))
    }

    pub fn classifier(&self) -> &LeafClassifier {
        &self.classifier
    }

    /// Extracts and scores one image. Returns the full report or nothing.
    pub fn analyze(&self, path: impl AsRef<Path>) -> Result<LeafReport, LeafError> {
        let path = path.as_ref();
        let features = extract_features(path)?;
        let classification = self.classifier.classify(&features);
        tracing::debug!(
            file = %path.display(),
            health = %classification.health,
            confidence = classification.confidence,
            "leaf analysed"
        );
        Ok(LeafReport {
            file: path.to_path_buf(),
            features,
            classification,
        })
    }

    /// Analyses every row in turn; a failing image is logged and left
    /// without results.
    pub fn classify_with_progress<F>(&self, rows: &mut [ImageInfo], mut progress: F)
    where
        F: FnMut(usize, usize),
    {
        let total = rows.len();
        for (idx, info) in rows.iter_mut().enumerate() {
            match self.analyze(&info.file) {
                Ok(report) => {
                    info.features = Some(report.features);
                    info.classification = Some(report.classification);
                }
                Err(err) => {
                    tracing::warn!("Classifier error for {}: {err}", info.file.display());
                    info.features = None;
                    info.classification = None;
                }
            }
            progress(idx + 1, total);
        }
    }
}
