//! Report exporter: session snapshot -> annotated document -> file.
//!
//! The document goes through whichever `DocumentRenderer` was injected; PDF
//! by default, HTML as an alternative.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{report_id, BoundingBox, ExportDocument, ExportError, Session, SummaryRow};
use crate::ports::{DocumentRenderer, ImageCodec};

/// File name used when the destination is a directory; the extension
/// follows the renderer.
pub const DEFAULT_EXPORT_NAME: &str = "Detection_Report.pdf";

pub const REPORT_TITLE: &str = "Brain Metastases Diagnostic Report";

pub const GENERATED_BY: &str = "Neuroscan Brain Metastases System";

/// Builds and writes diagnostic report documents.
///
/// Reads the session, never mutates it.
pub struct ReportExporter<C, R>
where
    C: ImageCodec,
    R: DocumentRenderer + ?Sized,
{
    codec: Arc<C>,
    renderer: Arc<R>,
}

impl<C, R> ReportExporter<C, R>
where
    C: ImageCodec,
    R: DocumentRenderer + ?Sized,
{
    pub fn new(codec: Arc<C>, renderer: Arc<R>) -> Self {
        Self { codec, renderer }
    }

    /// Extension of the files this exporter writes.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.renderer.extension()
    }

    /// Default file name for the configured renderer.
    #[must_use]
    pub fn default_file_name(&self) -> String {
        Path::new(DEFAULT_EXPORT_NAME)
            .with_extension(self.extension())
            .display()
            .to_string()
    }

    /// Assemble the document for the current session.
    ///
    /// # Errors
    /// `NoImage` if nothing is loaded, `Encoding` if the annotated image
    /// cannot be encoded.
    pub fn build_document(&self, session: &Session, now: DateTime<Utc>) -> Result<ExportDocument, ExportError> {
        let image = session.image().ok_or(ExportError::NoImage)?;

        let boxes: Vec<BoundingBox> = session.detections().iter().map(|d| d.bbox).collect();
        let annotated = self.codec.annotate(image, &boxes);
        let annotated_png = self.codec.encode_png(&annotated)?;

        let report = session.report();
        Ok(ExportDocument {
            report_id: report_id(),
            title: REPORT_TITLE.to_string(),
            generated_by: GENERATED_BY.to_string(),
            generated_at: now,
            source_name: image.display_name(),
            source_fingerprint: image.fingerprint().to_string(),
            summary: vec![
                SummaryRow::new("Malignancy Probability", format!("{}%", report.probability_percent)),
                SummaryRow::new("Lesion Count", report.lesion_count.to_string()),
                SummaryRow::new("Diagnosis", report.diagnosis.to_string()),
            ],
            annotated_png,
            findings: report.findings.clone(),
        })
    }

    /// Render the current session to document bytes.
    ///
    /// # Errors
    /// See [`Self::build_document`]; rendering failures surface as
    /// `ExportError::Rendering`.
    pub fn render(&self, session: &Session) -> Result<Vec<u8>, ExportError> {
        let document = self.build_document(session, Utc::now())?;
        self.renderer.render(&document)
    }

    /// Render and write the report, returning the final path.
    ///
    /// A directory destination receives `Detection_Report` with the
    /// renderer's extension; so does a path without an extension. The file is written to a
    /// temporary sibling and renamed into place, so a failed export leaves
    /// no partial file behind.
    ///
    /// # Errors
    /// `NoImage` (checked before touching the filesystem), rendering errors,
    /// or `Write` on I/O failure.
    pub fn export_to(&self, session: &Session, destination: &Path) -> Result<PathBuf, ExportError> {
        if session.image().is_none() {
            return Err(ExportError::NoImage);
        }

        let target = self.resolve_target(destination);
        let bytes = self.render(session)?;

        if let Err(e) = write_atomically(&target, &bytes) {
            tracing::error!("Report export to {} failed: {}", target.display(), e);
            return Err(e);
        }

        tracing::info!("Report exported to {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }

    fn resolve_target(&self, destination: &Path) -> PathBuf {
        if destination.is_dir() {
            return destination.join(self.default_file_name());
        }

        let mut target = destination.to_path_buf();
        if target.extension().is_none() {
            target.set_extension(self.renderer.extension());
        }
        target
    }
}

fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_string());
    target.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn write_then_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, target)
}

fn write_atomically(target: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let tmp = temp_sibling(target);

    if let Err(source) = write_then_rename(&tmp, target, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(ExportError::Write {
            path: target.to_path_buf(),
            source,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::html::HtmlReportRenderer;
    use crate::adapters::imaging::ImageRsCodec;
    use crate::adapters::pdf::PdfReportRenderer;
    use crate::domain::{Detection, MriImage};
    use chrono::TimeZone;
    use image::DynamicImage;

    struct BrokenRenderer;

    impl DocumentRenderer for BrokenRenderer {
        fn extension(&self) -> &'static str {
            "pdf"
        }

        fn render(&self, _document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
            Err(ExportError::Rendering("engine offline".into()))
        }
    }

    fn exporter() -> ReportExporter<ImageRsCodec, HtmlReportRenderer> {
        ReportExporter::new(Arc::new(ImageRsCodec::new()), Arc::new(HtmlReportRenderer::new()))
    }

    fn completed_session() -> Session {
        let mut session = Session::new();
        session.load(MriImage::new("/scans/axial_07.png", DynamicImage::new_rgb8(40, 40), "beef"));
        let ticket = session.begin_analysis().unwrap();
        session.complete_analysis(
            ticket.generation,
            vec![
                Detection::new("metastasis", 0.91, BoundingBox::new(2, 2, 10, 10).unwrap()),
                Detection::new("metastasis", 0.40, BoundingBox::new(20, 20, 30, 30).unwrap()),
            ],
        );
        session
    }

    #[test]
    fn test_document_summary_rows() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let doc = exporter().build_document(&completed_session(), now).unwrap();

        assert_eq!(doc.title, REPORT_TITLE);
        assert_eq!(doc.generated_at, now);
        assert_eq!(doc.source_name, "axial_07.png");
        assert_eq!(doc.source_fingerprint, "beef");
        assert_eq!(
            doc.summary,
            vec![
                SummaryRow::new("Malignancy Probability", "91%"),
                SummaryRow::new("Lesion Count", "2"),
                SummaryRow::new("Diagnosis", "Metastases"),
            ]
        );
        assert_eq!(doc.findings[0], "Detected 2 lesion(s).");
        assert!(doc.annotated_png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_export_without_image_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = exporter().export_to(&Session::new(), dir.path()).unwrap_err();

        assert!(matches!(err, ExportError::NoImage));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_directory_destination_uses_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ReportExporter::new(Arc::new(ImageRsCodec::new()), Arc::new(PdfReportRenderer::new()));
        let path = exporter.export_to(&completed_session(), dir.path()).unwrap();

        assert_eq!(path, dir.path().join("Detection_Report.pdf"));
        assert!(fs::read(&path).unwrap().starts_with(b"%PDF-"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_default_name_follows_renderer() {
        assert_eq!(exporter().default_file_name(), "Detection_Report.html");

        let renderer: Arc<dyn DocumentRenderer> = Arc::new(PdfReportRenderer::new());
        let exporter = ReportExporter::new(Arc::new(ImageRsCodec::new()), renderer);
        assert_eq!(exporter.extension(), "pdf");
        assert_eq!(exporter.default_file_name(), DEFAULT_EXPORT_NAME);
    }

    #[test]
    fn test_directory_destination_html() {
        let dir = tempfile::tempdir().unwrap();
        let path = exporter().export_to(&completed_session(), dir.path()).unwrap();

        assert_eq!(path, dir.path().join("Detection_Report.html"));
        assert!(fs::read_to_string(&path).unwrap().contains(REPORT_TITLE));
    }

    #[test]
    fn test_missing_extension_is_added() {
        let dir = tempfile::tempdir().unwrap();
        let path = exporter()
            .export_to(&completed_session(), &dir.path().join("case_12"))
            .unwrap();
        assert_eq!(path.extension().unwrap(), "html");
    }

    #[test]
    fn test_render_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ReportExporter::new(Arc::new(ImageRsCodec::new()), Arc::new(BrokenRenderer));
        let session = completed_session();

        let err = exporter.export_to(&session, &dir.path().join("out.pdf")).unwrap_err();
        assert!(matches!(err, ExportError::Rendering(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(session.report().lesion_count, 2);
    }

    #[test]
    fn test_unwritable_destination_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("no_such_dir").join("report.html");
        let err = exporter().export_to(&completed_session(), &target).unwrap_err();

        assert!(matches!(err, ExportError::Write { .. }));
        assert!(!target.exists());
    }
}
