//! Application configuration, optionally read from a TOML file.

use crate::scan::ScanOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the pretrained classifier lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/leaf_classifier.json"),
        }
    }
}

/// Top-level settings.
///
/// ```toml
/// [classifier]
/// model_path = "models/leaf_classifier.json"
///
/// [scan]
/// recursive = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    pub scan: ScanOptions,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("cannot parse config {}", path.display()))?;
        Ok(cfg)
    }

    /// Reads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_point_at_bundled_model() {
        let cfg = AppConfig::default();
        assert_eq!(
            cfg.classifier.model_path,
            PathBuf::from("models/leaf_classifier.json")
        );
        assert!(!cfg.scan.recursive);
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[scan]\nrecursive = true")?;
        let cfg = AppConfig::load(file.path())?;
        assert!(cfg.scan.recursive);
        assert_eq!(cfg.classifier, ClassifierConfig::default());
        Ok(())
    }

    #[test]
    fn model_path_is_read() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[classifier]\nmodel_path = \"/opt/leaf/model.json\"")?;
        let cfg = AppConfig::load(file.path())?;
        assert_eq!(cfg.classifier.model_path, PathBuf::from("/opt/leaf/model.json"));
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[classifier\nmodel_path = 3")?;
        assert!(AppConfig::load(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn no_path_means_defaults() -> Result<()> {
        assert_eq!(AppConfig::load_or_default(None)?, AppConfig::default());
        Ok(())
    }
}
