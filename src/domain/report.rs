//! Diagnostic report types and the detection aggregator.
//!
//! `aggregate` turns the raw detection list of one analysis run into the
//! clinical summary shown to the user and embedded in exported reports.

use serde::{Deserialize, Serialize};

use super::detection::Detection;

/// Finding shown when an analysis produced no detections.
pub const NO_ABNORMALITIES: &str = "No Abnormalities Detected.";

/// Finding shown after an image is loaded and before it is analyzed.
pub const READY_TO_ANALYZE: &str = "Ready to analyze.";

/// Finding shown before any image is loaded.
pub const LOAD_IMAGE_PROMPT: &str = "Load an image to start diagnosis.";

/// Categorical diagnosis derived from the lesion count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagnosis {
    /// No analysis result available
    Unknown,
    /// Analysis found no lesions
    Normal,
    /// Exactly one lesion, not consistent with metastatic spread
    NotMetastases,
    /// Multiple lesions, consistent with metastatic spread
    Metastases,
}

impl Diagnosis {
    /// Map a non-empty analysis to a diagnosis.
    ///
    /// A count of zero maps to `Unknown`; empty analyses are reported as
    /// `Normal` by [`aggregate`] before this rule is consulted.
    #[must_use]
    pub fn from_lesion_count(lesion_count: usize) -> Self {
        match lesion_count {
            0 => Self::Unknown,
            1 => Self::NotMetastases,
            _ => Self::Metastases,
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unknown => "No analysis result available",
            Self::Normal => "No lesions identified on this slice",
            Self::NotMetastases => "Solitary lesion identified",
            Self::Metastases => "Multiple lesions identified - review advised",
        }
    }

    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Unknown => (148, 163, 184),      // Slate (#94A3B8)
            Self::Normal => (16, 185, 129),        // Emerald (#10B981)
            Self::NotMetastases => (251, 191, 36), // Amber (#FBBF24)
            Self::Metastases => (244, 63, 94),     // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Normal => write!(f, "Normal"),
            Self::NotMetastases => write!(f, "Not Metastases"),
            Self::Metastases => write!(f, "Metastases"),
        }
    }
}

/// Clinical summary of one analysis run.
///
/// Always rebuilt as a whole from a detection list, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Highest detection confidence, as a floored percentage
    pub probability_percent: u8,

    /// Number of detections
    pub lesion_count: usize,

    /// Categorical diagnosis
    pub diagnosis: Diagnosis,

    /// Ordered findings, one line each
    pub findings: Vec<String>,
}

impl DiagnosticReport {
    /// Placeholder shown while no image is loaded.
    #[must_use]
    pub fn idle() -> Self {
        Self::placeholder(LOAD_IMAGE_PROMPT)
    }

    /// Placeholder shown after an image load, before analysis.
    #[must_use]
    pub fn pending() -> Self {
        Self::placeholder(READY_TO_ANALYZE)
    }

    fn placeholder(finding: &str) -> Self {
        Self {
            probability_percent: 0,
            lesion_count: 0,
            diagnosis: Diagnosis::Unknown,
            findings: vec![finding.to_string()],
        }
    }
}

impl Default for DiagnosticReport {
    fn default() -> Self {
        Self::idle()
    }
}

/// First detection with the highest confidence, in input order.
#[must_use]
pub fn primary_lesion(detections: &[Detection]) -> Option<&Detection> {
    detections.iter().fold(None, |best: Option<&Detection>, d| match best {
        Some(b) if d.confidence <= b.confidence => Some(b),
        _ => Some(d),
    })
}

/// Build the diagnostic report for a detection list.
#[must_use]
pub fn aggregate(detections: &[Detection]) -> DiagnosticReport {
    let Some(best) = primary_lesion(detections) else {
        return DiagnosticReport {
            probability_percent: 0,
            lesion_count: 0,
            diagnosis: Diagnosis::Normal,
            findings: vec![NO_ABNORMALITIES.to_string()],
        };
    };

    let probability_percent = (best.confidence * 100.0).floor() as u8;
    let lesion_count = detections.len();
    let diagnosis = Diagnosis::from_lesion_count(lesion_count);

    DiagnosticReport {
        probability_percent,
        lesion_count,
        diagnosis,
        findings: vec![
            format!("Detected {lesion_count} lesion(s)."),
            format!("Diagnosis: {diagnosis}"),
            format!("Max Confidence: {probability_percent}%"),
            format!("Primary lesion: {}", best.label),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoundingBox;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn det(label: &str, confidence: f32) -> Detection {
        Detection::new(label, confidence, BoundingBox::new(10, 10, 40, 40).unwrap())
    }

    #[test]
    fn test_empty_detections_are_normal() {
        let report = aggregate(&[]);
        assert_eq!(
            report,
            DiagnosticReport {
                probability_percent: 0,
                lesion_count: 0,
                diagnosis: Diagnosis::Normal,
                findings: vec!["No Abnormalities Detected.".to_string()],
            }
        );
    }

    #[test]
    fn test_three_lesions_are_metastases() {
        let detections = vec![det("A", 0.91), det("B", 0.40), det("C", 0.76)];
        let report = aggregate(&detections);

        assert_eq!(report.probability_percent, 91);
        assert_eq!(report.lesion_count, 3);
        assert_eq!(report.diagnosis, Diagnosis::Metastases);
        assert_eq!(
            report.findings,
            vec![
                "Detected 3 lesion(s).",
                "Diagnosis: Metastases",
                "Max Confidence: 91%",
                "Primary lesion: A",
            ]
        );
    }

    #[test]
    fn test_single_lesion_is_not_metastases() {
        let report = aggregate(&[det("lesion", 0.30)]);
        assert_eq!(report.probability_percent, 30);
        assert_eq!(report.lesion_count, 1);
        assert_eq!(report.diagnosis, Diagnosis::NotMetastases);
        assert_eq!(report.findings[1], "Diagnosis: Not Metastases");
    }

    #[test]
    fn test_tie_picks_first_in_input_order() {
        let detections = vec![det("first", 0.8), det("second", 0.8), det("low", 0.2)];
        let best = primary_lesion(&detections).unwrap();
        assert_eq!(best.label, "first");
        assert_eq!(aggregate(&detections).findings[3], "Primary lesion: first");
    }

    #[test]
    fn test_probability_is_floored() {
        assert_eq!(aggregate(&[det("x", 0.999)]).probability_percent, 99);
        assert_eq!(aggregate(&[det("x", 1.0)]).probability_percent, 100);
        assert_eq!(aggregate(&[det("x", 0.0)]).probability_percent, 0);
    }

    #[test]
    fn test_diagnosis_mapping() {
        assert_eq!(Diagnosis::from_lesion_count(0), Diagnosis::Unknown);
        assert_eq!(Diagnosis::from_lesion_count(1), Diagnosis::NotMetastases);
        assert_eq!(Diagnosis::from_lesion_count(2), Diagnosis::Metastases);
        assert_eq!(Diagnosis::from_lesion_count(57), Diagnosis::Metastases);
    }

    #[test]
    fn test_random_lists_hold_report_invariants() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..500 {
            let n = rng.gen_range(0..12);
            let detections: Vec<Detection> = (0..n)
                .map(|i| det(&format!("L{i}"), rng.gen_range(0.0f32..=1.0)))
                .collect();

            let report = aggregate(&detections);
            assert_eq!(report.lesion_count, detections.len());
            assert!(report.probability_percent <= 100);
            assert_eq!(report, aggregate(&detections));

            if let Some(max) = detections.iter().map(|d| d.confidence).reduce(f32::max) {
                assert_eq!(report.probability_percent, (max * 100.0).floor() as u8);
                assert_eq!(report.findings.len(), 4);
                assert_eq!(report.diagnosis, Diagnosis::from_lesion_count(n));
            } else {
                assert_eq!(report.diagnosis, Diagnosis::Normal);
            }
        }
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(DiagnosticReport::idle().findings, vec![LOAD_IMAGE_PROMPT]);
        assert_eq!(DiagnosticReport::pending().findings, vec![READY_TO_ANALYZE]);
        assert_eq!(DiagnosticReport::pending().diagnosis, Diagnosis::Unknown);
        assert_eq!(DiagnosticReport::pending().lesion_count, 0);
    }
}
