//! Exportable report document model.
//!
//! Built on demand for a single export and handed to a `DocumentRenderer`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the diagnosis results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

impl SummaryRow {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Fixed-layout diagnostic report: title, metadata, results table,
/// annotated image, findings list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Unique identifier
    pub report_id: String,

    pub title: String,

    /// Generating application
    pub generated_by: String,

    /// Timestamp of generation
    pub generated_at: DateTime<Utc>,

    /// Source image file name
    pub source_name: String,

    /// Hex SHA-256 of the source image file
    pub source_fingerprint: String,

    /// Probability, lesion count, diagnosis (in that order)
    pub summary: Vec<SummaryRow>,

    /// PNG bytes of the image with detection outlines
    #[serde(skip)]
    pub annotated_png: Vec<u8>,

    /// Ordered clinical findings
    pub findings: Vec<String>,
}

/// Generate a random UUID v4 for report identification.
#[must_use]
pub fn report_id() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_ids_are_unique_v4() {
        let a = report_id();
        let b = report_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
        assert_eq!(a.as_bytes()[14], b'4');
    }
}
