//! Application layer: Use cases orchestrating domain and ports.
//!
//! - `DetectionModel`: the loaded (or unavailable) detection capability
//! - `DetectionRunner`: runs one detection off the interactive thread
//! - `AnalysisService`: owns the session and applies completions
//! - `ReportExporter`: turns the session into a written report

mod analysis;
mod detection;
mod export;
mod runner;

pub use analysis::{AnalysisEvent, AnalysisService};
pub use detection::DetectionModel;
pub use export::{ReportExporter, DEFAULT_EXPORT_NAME, GENERATED_BY, REPORT_TITLE};
pub use runner::{DetectionCompletion, DetectionJob, DetectionRunner};
