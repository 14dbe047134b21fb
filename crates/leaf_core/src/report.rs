//! Data handed to the presentation layer after a successful analysis.

use crate::classifier::{Classification, Health};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Complete result of analysing one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafReport {
    pub file: PathBuf,
    pub features: FeatureVector,
    pub classification: Classification,
}

impl LeafReport {
    pub fn health(&self) -> Health {
        self.classification.health
    }

    /// Human readable summary: status, confidence, raw features, and both
    /// class probabilities.
    pub fn render_text(&self) -> String {
        let f = &self.features;
        let c = &self.classification;
        let status = match c.health {
            Health::Healthy => "Healthy",
            Health::Unhealthy => "Unhealthy",
        };
        let mut out = String::new();
        let _ = writeln!(out, "Status: {status}");
        let _ = writeln!(out, "Confidence: {:.2}", c.confidence);
        let _ = writeln!(
            out,
            "Mean HSV (H, S, V): ({:.2}, {:.2}, {:.2})",
            f.mean_hue, f.mean_saturation, f.mean_value
        );
        let _ = writeln!(out, "Edge density: {:.4}", f.edge_density);
        let _ = writeln!(out, "Contrast: {:.4}", f.contrast);
        out.push('\n');
        let _ = writeln!(out, "Healthy probability: {:.2}", c.probabilities.healthy);
        let _ = write!(out, "Unhealthy probability: {:.2}", c.probabilities.unhealthy);
        out
    }

    /// Bar chart series, unhealthy first.
    pub fn chart_series(&self) -> [(&'static str, f64); 2] {
        let p = &self.classification.probabilities;
        [
            (Health::Unhealthy.as_str(), p.unhealthy),
            (Health::Healthy.as_str(), p.healthy),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassProbabilities;

    fn report() -> LeafReport {
        LeafReport {
            file: PathBuf::from("leaf.jpg"),
            features: FeatureVector::from_array([41.256, 120.0, 99.999, 3.18, 12.345678]),
            classification: Classification {
                health: Health::Healthy,
                confidence: 0.876,
                probabilities: ClassProbabilities {
                    unhealthy: 0.124,
                    healthy: 0.876,
                },
            },
        }
    }

    #[test]
    fn render_text_formats_every_field() {
        let text = report().render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Status: Healthy",
                "Confidence: 0.88",
                "Mean HSV (H, S, V): (41.26, 120.00, 100.00)",
                "Edge density: 3.1800",
                "Contrast: 12.3457",
                "",
                "Healthy probability: 0.88",
                "Unhealthy probability: 0.12",
            ]
        );
    }

    #[test]
    fn chart_series_lists_unhealthy_first() {
        let series = report().chart_series();
        assert_eq!(series[0], ("unhealthy", 0.124));
        assert_eq!(series[1], ("healthy", 0.876));
    }

    #[test]
    fn report_serializes_to_json() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["classification"]["health"], "healthy");
        assert_eq!(json["features"]["edge_density"], 3.18);
    }
}
