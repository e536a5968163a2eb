//! Error taxonomy for the screening pipeline.
//!
//! Only `ImageDecodeError` and `ExportError` are meant to interrupt the
//! user-visible flow. `ModelLoadError` and `InferenceError` degrade to an
//! empty detection list.

use std::path::PathBuf;

/// Model artifacts are missing or could not be initialized.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model artifact not found: {0}")]
    MissingArtifact(PathBuf),

    #[error("Invalid model definition: {0}")]
    InvalidDefinition(String),

    #[error("Inference runtime failed to initialize: {0}")]
    Runtime(String),
}

/// The requested image could not be read or decoded.
#[derive(Debug, thiserror::Error)]
pub enum ImageDecodeError {
    #[error("Cannot read image {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported or corrupt image {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Failure inside a single detection call.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Detection model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Unexpected model output: {0}")]
    MalformedOutput(String),

    #[error("Inference runtime error: {0}")]
    Runtime(String),

    #[error("Detection worker crashed: {0}")]
    WorkerPanicked(String),
}

/// Report export could not be completed.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No image loaded to export")]
    NoImage,

    #[error("Image encoding failed: {0}")]
    Encoding(String),

    #[error("Document rendering failed: {0}")]
    Rendering(String),

    #[error("Cannot write report to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rejected session transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("No image loaded")]
    NoImage,

    #[error("Analysis already in progress")]
    AlreadyAnalyzing,

    #[error("Previous analysis is still finishing")]
    WorkerBusy,
}
