//! Folder scanning and CSV export for batch runs.

use crate::classifier::Classification;
use crate::features::FeatureVector;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One image found by a scan, with results once it has been analysed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub file: PathBuf,
    pub features: Option<FeatureVector>,
    pub classification: Option<Classification>,
}

impl ImageInfo {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            features: None,
            classification: None,
        }
    }

    pub fn is_analyzed(&self) -> bool {
        self.features.is_some() && self.classification.is_some()
    }
}

/// Options controlling how folder scanning behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// When true, scan subdirectories recursively.
    pub recursive: bool,
}

/// Scan a folder for images and produce basic `ImageInfo` entries.
pub fn scan_folder(path: impl AsRef<Path>) -> Result<Vec<ImageInfo>> {
    scan_folder_with(path, ScanOptions::default())
}

/// Scan a folder with options. Entries come back sorted by path.
pub fn scan_folder_with(path: impl AsRef<Path>, opts: ScanOptions) -> Result<Vec<ImageInfo>> {
    let root = path.as_ref();
    if !root.exists() {
        anyhow::bail!("Path does not exist: {}", root.display());
    }
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }

    let walker = if opts.recursive {
        WalkDir::new(root)
    } else {
        WalkDir::new(root).max_depth(1)
    };

    let mut infos: Vec<ImageInfo> = Vec::new();
    for entry in walker.sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("walkdir error: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && is_supported_image(path) {
            infos.push(ImageInfo::new(path));
        }
    }

    tracing::debug!(root = %root.display(), found = infos.len(), "folder scanned");
    Ok(infos)
}

/// Export the provided rows to CSV with headers:
/// file,status,confidence,mean_hue,mean_saturation,mean_value,edge_density,contrast,p_unhealthy,p_healthy
pub fn export_csv(rows: &[ImageInfo], path: impl AsRef<Path>) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "file",
        "status",
        "confidence",
        "mean_hue",
        "mean_saturation",
        "mean_value",
        "edge_density",
        "contrast",
        "p_unhealthy",
        "p_healthy",
    ])?;

    for info in rows {
        let mut record: Vec<String> = vec![info.file.to_string_lossy().into_owned()];
        match &info.classification {
            Some(c) => {
                record.push(c.health.to_string());
                record.push(format!("{}", c.confidence));
            }
            None => record.extend([String::new(), String::new()]),
        }
        match &info.features {
            Some(f) => record.extend(f.to_array().iter().map(|v| format!("{v}"))),
            None => record.extend(std::iter::repeat_n(String::new(), 5)),
        }
        match &info.classification {
            Some(c) => record.extend(c.probabilities.as_array().iter().map(|v| format!("{v}"))),
            None => record.extend([String::new(), String::new()]),
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            matches!(ext.as_str(), "jpg" | "jpeg" | "png")
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassProbabilities, Health};
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn export_csv_writes_expected_headers_and_rows() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        let rows = vec![
            ImageInfo::new("a.jpg"),
            ImageInfo {
                file: PathBuf::from("b.png"),
                features: Some(FeatureVector::from_array([30.5, 110.0, 90.25, 2.5, 14.0])),
                classification: Some(Classification {
                    health: Health::Unhealthy,
                    confidence: 0.75,
                    probabilities: ClassProbabilities {
                        unhealthy: 0.75,
                        healthy: 0.25,
                    },
                }),
            },
        ];

        export_csv(&rows, &path)?;

        let mut rdr = csv::Reader::from_path(&path)?;
        let headers = rdr.headers()?.clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "file",
                "status",
                "confidence",
                "mean_hue",
                "mean_saturation",
                "mean_value",
                "edge_density",
                "contrast",
                "p_unhealthy",
                "p_healthy"
            ]
        );

        let mut recs = rdr.records();
        let r1 = recs.next().unwrap()?;
        assert_eq!(&r1[0], "a.jpg");
        assert!(r1.iter().skip(1).all(|field| field.is_empty()));

        let r2 = recs.next().unwrap()?;
        assert_eq!(
            r2.iter().collect::<Vec<_>>(),
            vec![
                "b.png",
                "unhealthy",
                "0.75",
                "30.5",
                "110",
                "90.25",
                "2.5",
                "14",
                "0.75",
                "0.25"
            ]
        );

        assert!(recs.next().is_none());
        Ok(())
    }

    fn leaf_names(root: &Path, rows: &[ImageInfo]) -> Vec<String> {
        rows.iter()
            .map(|i| {
                let rel = i.file.strip_prefix(root).unwrap();
                rel.to_string_lossy().replace('\\', "/")
            })
            .collect()
    }

    // created out of order on purpose; results must come back sorted
    fn leaf_folder(root: &Path) -> Result<()> {
        File::create(root.join("oak_03.PNG"))?;
        File::create(root.join("notes.txt"))?;
        File::create(root.join("maple_01.jpg"))?;
        File::create(root.join("Ash_04.jpg"))?;
        File::create(root.join("birch_02.jpeg"))?;
        let nested = root.join("nested");
        fs::create_dir(&nested)?;
        File::create(nested.join("elm.jpg"))?;
        File::create(nested.join("elm.gif"))?;
        Ok(())
    }

    #[test]
    fn folder_without_leaf_images_yields_nothing() -> Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("notes.txt"))?;
        File::create(dir.path().join("leaf.gif"))?;
        fs::create_dir(dir.path().join("photos.jpg"))?;
        assert!(scan_folder(dir.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn scan_folder_rejects_missing_and_file_roots() -> Result<()> {
        let dir = tempdir()?;
        assert!(scan_folder(dir.path().join("missing")).is_err());
        let file = dir.path().join("leaf.png");
        File::create(&file)?;
        assert!(scan_folder(&file).is_err());
        Ok(())
    }

    #[test]
    fn top_level_leaves_are_listed_in_file_name_order() -> Result<()> {
        let dir = tempdir()?;
        leaf_folder(dir.path())?;

        let rows = scan_folder_with(dir.path(), ScanOptions { recursive: false })?;
        assert_eq!(
            leaf_names(dir.path(), &rows),
            vec!["Ash_04.jpg", "birch_02.jpeg", "maple_01.jpg", "oak_03.PNG"]
        );
        assert!(rows.iter().all(|r| !r.is_analyzed()));
        Ok(())
    }

    #[test]
    fn recursive_scan_visits_subfolders_in_place() -> Result<()> {
        let dir = tempdir()?;
        leaf_folder(dir.path())?;

        let rows = scan_folder_with(dir.path(), ScanOptions { recursive: true })?;
        assert_eq!(
            leaf_names(dir.path(), &rows),
            vec![
                "Ash_04.jpg",
                "birch_02.jpeg",
                "maple_01.jpg",
                "nested/elm.jpg",
                "oak_03.PNG"
            ]
        );
        Ok(())
    }
}
