//! Document port: renders an `ExportDocument` to bytes.

use crate::domain::{ExportDocument, ExportError};

/// Document rendering capability.
pub trait DocumentRenderer: Send + Sync {
    /// File extension of the produced format (without the dot).
    fn extension(&self) -> &'static str;

    /// Render the document.
    ///
    /// # Errors
    /// Returns `ExportError::Rendering` if the document cannot be produced.
    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>, ExportError>;
}
