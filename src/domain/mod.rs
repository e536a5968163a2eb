//! Domain layer: Core screening types and logic.
//!
//! Pure types with no I/O. The report aggregator and the session state
//! machine live here so they can be tested without any model or image files.

mod detection;
mod document;
mod errors;
mod mri;
mod report;
mod session;

pub use detection::{BoundingBox, Detection};
pub use document::{report_id, ExportDocument, SummaryRow};
pub use errors::{ExportError, ImageDecodeError, InferenceError, ModelLoadError, SessionError};
pub use mri::MriImage;
pub use report::{
    aggregate, primary_lesion, Diagnosis, DiagnosticReport, LOAD_IMAGE_PROMPT, NO_ABNORMALITIES,
    READY_TO_ANALYZE,
};
pub use session::{AnalysisTicket, CompletionOutcome, Session, SessionState};
