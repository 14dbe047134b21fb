//! Subcommand bodies. Reports go to `out`, per-image diagnostics to `err`.

use crate::APP_VERSION;
use anyhow::{Context, Result};
use leaf_core::{AppConfig, AppContext, Health, export_csv, extract_features, scan_folder_with};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Result of a command that ran to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Inputs that were reported as failed.
    pub failed: usize,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        if self.failed == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

fn load_context(cfg: &AppConfig) -> Result<AppContext> {
    AppContext::from_config(&cfg.classifier).context("cannot load classifier")
}

/// Analyzes each image in turn; one bad image does not stop the rest.
pub fn classify(
    cfg: &AppConfig,
    images: &[PathBuf],
    json: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<Outcome> {
    let ctx = load_context(cfg)?;
    let mut outcome = Outcome::default();
    for (idx, image) in images.iter().enumerate() {
        match ctx.analyze(image) {
            Ok(report) => {
                if json {
                    writeln!(out, "{}", serde_json::to_string(&report)?)?;
                } else {
                    if idx > 0 {
                        writeln!(out)?;
                    }
                    writeln!(out, "{}", report.file.display())?;
                    writeln!(out, "{}", report.render_text())?;
                }
            }
            Err(e) => {
                outcome.failed += 1;
                tracing::debug!(image = %image.display(), error = ?e, "analysis failed");
                writeln!(err, "{}: {e}", image.display())?;
            }
        }
    }
    Ok(outcome)
}

pub fn features(image: &Path, json: bool, out: &mut impl Write) -> Result<Outcome> {
    let v = extract_features(image)?;
    if json {
        writeln!(out, "{}", serde_json::to_string(&v)?)?;
    } else {
        writeln!(
            out,
            "Mean HSV (H, S, V): ({:.2}, {:.2}, {:.2})",
            v.mean_hue, v.mean_saturation, v.mean_value
        )?;
        writeln!(out, "Edge density: {:.4}", v.edge_density)?;
        writeln!(out, "Contrast: {:.4}", v.contrast)?;
    }
    Ok(Outcome::default())
}

/// Batch mode. Unreadable images are counted in the summary, not fatal.
pub fn scan(
    cfg: &AppConfig,
    dir: &Path,
    csv: Option<&Path>,
    out: &mut impl Write,
) -> Result<Outcome> {
    let ctx = load_context(cfg)?;
    let mut rows = scan_folder_with(dir, cfg.scan)?;
    if rows.is_empty() {
        writeln!(out, "No images found in {}", dir.display())?;
        return Ok(Outcome::default());
    }

    ctx.classify_with_progress(&mut rows, |done, total| {
        tracing::debug!("classified {done}/{total}");
    });

    let count = |health: Health| {
        rows.iter()
            .filter(|r| r.classification.is_some_and(|c| c.health == health))
            .count()
    };
    let healthy = count(Health::Healthy);
    let unhealthy = count(Health::Unhealthy);
    let failed = rows.len() - healthy - unhealthy;
    writeln!(
        out,
        "Total: {} | Healthy: {healthy} | Unhealthy: {unhealthy} | Failed: {failed}",
        rows.len()
    )?;

    if let Some(path) = csv {
        export_csv(&rows, path)
            .with_context(|| format!("cannot write CSV {}", path.display()))?;
        writeln!(out, "CSV written: {}", path.display())?;
    }
    Ok(Outcome::default())
}

pub fn about_text() -> String {
    format!(
        "leafcheck {APP_VERSION}\n\
         Classifies leaf images as healthy or unhealthy with a pretrained model.\n\
         Features: mean HSV, edge density, GLCM contrast."
    )
}
