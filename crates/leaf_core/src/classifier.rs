//! Adapter around the pretrained healthy/unhealthy classifier.
//!
//! The model is an exported parameter set, stored as JSON. Two estimator
//! families are understood: a kernel SVM with Platt-scaled probabilities and
//! plain logistic regression, each optionally preceded by standardisation.
//! A positive decision value always means "healthy" (class index 1).

use crate::config::ClassifierConfig;
use crate::error::ModelError;
use crate::features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Predicted class of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Unhealthy,
    Healthy,
}

impl Health {
    /// Index of the class in the training labels.
    pub fn class_index(self) -> usize {
        match self {
            Health::Unhealthy => 0,
            Health::Healthy => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Health::Unhealthy => "unhealthy",
            Health::Healthy => "healthy",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability pair over `{unhealthy, healthy}`, summing to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub unhealthy: f64,
    pub healthy: f64,
}

impl ClassProbabilities {
    fn from_healthy(healthy: f64) -> Self {
        Self {
            unhealthy: 1.0 - healthy,
            healthy,
        }
    }

    /// `[p_unhealthy, p_healthy]`, indexed by class.
    pub fn as_array(&self) -> [f64; 2] {
        let mut out = [0.0; 2];
        for health in [Health::Unhealthy, Health::Healthy] {
            out[health.class_index()] = self.of(health);
        }
        out
    }

    pub fn of(&self, health: Health) -> f64 {
        match health {
            Health::Unhealthy => self.unhealthy,
            Health::Healthy => self.healthy,
        }
    }
}

/// Outcome of scoring one feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub health: Health,
    /// Probability of the predicted class.
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
}

/// Serialized model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Feature order the model was fitted on.
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub estimator: Estimator,
}

/// `(x - mean) / scale`, per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Svc(SvcModel),
    Logistic(LogisticModel),
}

/// Binary support vector classifier.
///
/// `f(x) = sum(dual_coef[i] * K(sv[i], x)) + intercept` and
/// `p_healthy = 1 / (1 + exp(prob_a * f(x) + prob_b))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvcModel {
    pub kernel: Kernel,
    pub support_vectors: Vec<Vec<f64>>,
    pub dual_coef: Vec<f64>,
    pub intercept: f64,
    pub prob_a: f64,
    pub prob_b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
    Poly { gamma: f64, coef0: f64, degree: u32 },
    Sigmoid { gamma: f64, coef0: f64 },
}

impl Kernel {
    fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { gamma } => {
                let dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * dist).exp()
            }
            Kernel::Poly {
                gamma,
                coef0,
                degree,
            } => {
                // validate() keeps the degree within i32
                let degree = i32::try_from(degree).unwrap_or(i32::MAX);
                (gamma * dot(a, b) + coef0).powi(degree)
            }
            Kernel::Sigmoid { gamma, coef0 } => (gamma * dot(a, b) + coef0).tanh(),
        }
    }

    fn params(&self) -> Vec<f64> {
        match *self {
            Kernel::Linear => Vec::new(),
            Kernel::Rbf { gamma } => vec![gamma],
            Kernel::Poly { gamma, coef0, .. } | Kernel::Sigmoid { gamma, coef0 } => {
                vec![gamma, coef0]
            }
        }
    }
}

/// Logistic regression, `p_healthy = sigmoid(coef . x + intercept)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

/// Validated, read-only classifier.
#[derive(Debug, Clone)]
pub struct LeafClassifier {
    artifact: ModelArtifact,
}

impl LeafClassifier {
    /// Loads and validates the model artifact at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::Missing(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact =
            serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let classifier = Self::from_artifact(artifact)?;
        tracing::info!(
            path = %path.display(),
            kind = classifier.kind(),
            "leaf classifier loaded"
        );
        Ok(classifier)
    }

    pub fn from_config(cfg: &ClassifierConfig) -> Result<Self, ModelError> {
        Self::load(&cfg.model_path)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        validate(&artifact)?;
        Ok(Self { artifact })
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn kind(&self) -> &'static str {
        match self.artifact.estimator {
            Estimator::Svc(_) => "svc",
            Estimator::Logistic(_) => "logistic",
        }
    }

    /// Signed distance from the decision boundary; positive means healthy.
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        let x = self.prepare(features);
        match &self.artifact.estimator {
            Estimator::Svc(svc) => {
                svc.support_vectors
                    .iter()
                    .zip(&svc.dual_coef)
                    .map(|(sv, alpha)| alpha * svc.kernel.eval(sv, &x))
                    .sum::<f64>()
                    + svc.intercept
            }
            Estimator::Logistic(lr) => dot(&lr.coef, &x) + lr.intercept,
        }
    }

    pub fn predict(&self, features: &FeatureVector) -> Health {
        if self.decision_function(features) > 0.0 {
            Health::Healthy
        } else {
            Health::Unhealthy
        }
    }

    pub fn predict_proba(&self, features: &FeatureVector) -> ClassProbabilities {
        let f = self.decision_function(features);
        let healthy = match &self.artifact.estimator {
            Estimator::Svc(svc) => platt(f, svc.prob_a, svc.prob_b),
            Estimator::Logistic(_) => platt(f, -1.0, 0.0),
        };
        ClassProbabilities::from_healthy(healthy)
    }

    /// Label, confidence and probabilities in one pass.
    pub fn classify(&self, features: &FeatureVector) -> Classification {
        let health = self.predict(features);
        let probabilities = self.predict_proba(features);
        Classification {
            health,
            confidence: probabilities.of(health),
            probabilities,
        }
    }

    /// [`predict`](Self::predict) for raw values, checking the length first.
    pub fn predict_slice(&self, values: &[f64]) -> Result<Health, ModelError> {
        Ok(self.predict(&FeatureVector::from_slice(values)?))
    }

    pub fn predict_proba_slice(&self, values: &[f64]) -> Result<ClassProbabilities, ModelError> {
        Ok(self.predict_proba(&FeatureVector::from_slice(values)?))
    }

    fn prepare(&self, features: &FeatureVector) -> [f64; FEATURE_COUNT] {
        let mut x = features.to_array();
        if let Some(scaler) = &self.artifact.scaler {
            for (i, v) in x.iter_mut().enumerate() {
                *v = (*v - scaler.mean[i]) / scaler.scale[i];
            }
        }
        x
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// 1 / (1 + exp(a*f + b)) without overflowing exp
fn platt(f: f64, a: f64, b: f64) -> f64 {
    let fapb = f * a + b;
    if fapb >= 0.0 {
        let e = (-fapb).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + fapb.exp())
    }
}

fn validate(artifact: &ModelArtifact) -> Result<(), ModelError> {
    if artifact.format_version != MODEL_FORMAT_VERSION {
        return Err(invalid(format!(
            "unsupported format version {} (expected {MODEL_FORMAT_VERSION})",
            artifact.format_version
        )));
    }
    if artifact.feature_names != FEATURE_NAMES {
        return Err(invalid(format!(
            "feature order {:?} does not match {:?}",
            artifact.feature_names, FEATURE_NAMES
        )));
    }
    if let Some(scaler) = &artifact.scaler {
        check_len("scaler.mean", &scaler.mean)?;
        check_len("scaler.scale", &scaler.scale)?;
        check_finite("scaler.mean", &scaler.mean)?;
        check_finite("scaler.scale", &scaler.scale)?;
        if scaler.scale.iter().any(|s| *s == 0.0) {
            return Err(invalid("scaler.scale contains zero".to_string()));
        }
    }
    match &artifact.estimator {
        Estimator::Svc(svc) => {
            if svc.support_vectors.is_empty() {
                return Err(invalid("svc has no support vectors".to_string()));
            }
            if svc.dual_coef.len() != svc.support_vectors.len() {
                return Err(invalid(format!(
                    "svc has {} dual coefficients for {} support vectors",
                    svc.dual_coef.len(),
                    svc.support_vectors.len()
                )));
            }
            for sv in &svc.support_vectors {
                check_len("svc.support_vectors", sv)?;
                check_finite("svc.support_vectors", sv)?;
            }
            check_finite("svc.dual_coef", &svc.dual_coef)?;
            check_finite("svc.kernel", &svc.kernel.params())?;
            if let Kernel::Poly { degree, .. } = svc.kernel {
                if i32::try_from(degree).is_err() {
                    return Err(invalid(format!("svc kernel degree {degree} is too large")));
                }
            }
            check_finite("svc", &[svc.intercept, svc.prob_a, svc.prob_b])?;
        }
        Estimator::Logistic(lr) => {
            check_len("logistic.coef", &lr.coef)?;
            check_finite("logistic.coef", &lr.coef)?;
            check_finite("logistic.intercept", &[lr.intercept])?;
        }
    }
    Ok(())
}

fn check_len(field: &str, values: &[f64]) -> Result<(), ModelError> {
    if values.len() != FEATURE_COUNT {
        return Err(invalid(format!(
            "{field} has {} values, expected {FEATURE_COUNT}",
            values.len()
        )));
    }
    Ok(())
}

fn check_finite(field: &str, values: &[f64]) -> Result<(), ModelError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(invalid(format!("{field} contains a non-finite value")));
    }
    Ok(())
}

fn invalid(msg: String) -> ModelError {
    ModelError::Invalid(msg)
}
