//! # Neuroscan
//!
//! Brain metastases screening on MRI slices.
//!
//! This crate provides:
//! - Lesion detection through an ONNX object-detection model
//! - Aggregation of detections into a diagnostic report
//! - A session state machine guarding load/analyze/export
//! - Self-contained report export with the annotated image
//! - Terminal UI for local use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (Detection, DiagnosticReport, Session)
//! - `ports`: Trait definitions for external capabilities
//! - `adapters`: Concrete implementations (ONNX Runtime, image, PDF, HTML)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{Detection, Diagnosis, DiagnosticReport};

/// Result type for Neuroscan operations
pub type Result<T> = std::result::Result<T, NeuroscanError>;

/// Main error type for Neuroscan
///
/// Detection failures are not listed: they degrade to an empty result
/// inside the application layer and never reach callers as errors.
#[derive(Debug, thiserror::Error)]
pub enum NeuroscanError {
    #[error("Image load failed: {0}")]
    ImageDecode(#[from] domain::ImageDecodeError),

    #[error("Export failed: {0}")]
    Export(#[from] domain::ExportError),

    #[error("{0}")]
    Session(#[from] domain::SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
