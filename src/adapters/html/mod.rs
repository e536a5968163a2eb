//! Self-contained HTML report renderer.
//!
//! The annotated image is embedded as a base64 data URI so the exported file
//! can be shared on its own.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::domain::{ExportDocument, ExportError};
use crate::ports::DocumentRenderer;

const STYLESHEET: &str = r#"
    body { font-family: sans-serif; padding: 40px; color: #333; max-width: 820px; margin: auto; }
    h1 { color: #1e293b; font-size: 24px; border-bottom: 2px solid #334155; padding-bottom: 10px; }
    .meta { color: #64748b; font-size: 12px; margin-bottom: 20px; }
    .section { margin-bottom: 25px; }
    .label { font-weight: bold; color: #475569; }
    .value { color: #0f172a; }
    .image-container { text-align: center; margin: 20px 0; border: 1px solid #ddd; padding: 10px; }
    img { max-width: 100%; height: auto; }
    .stats-table { width: 100%; border-collapse: collapse; margin-top: 10px; }
    .stats-table td { padding: 8px; border-bottom: 1px solid #eee; }
"#;

/// Renders reports as a single HTML page.
#[derive(Debug, Clone, Default)]
pub struct HtmlReportRenderer;

impl HtmlReportRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl DocumentRenderer for HtmlReportRenderer {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
        if document.annotated_png.is_empty() {
            return Err(ExportError::Rendering("document has no image".into()));
        }

        let date = document.generated_at.format("%B %-d, %Y %H:%M UTC");

        let rows: String = document
            .summary
            .iter()
            .map(|row| {
                format!(
                    "            <tr><td class=\"label\">{}</td><td class=\"value\">{}</td></tr>\n",
                    escape(&row.label),
                    escape(&row.value)
                )
            })
            .collect();

        let findings: String = document
            .findings
            .iter()
            .map(|f| format!("            <li>{}</li>\n", escape(f)))
            .collect();

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>{STYLESHEET}</style>
</head>
<body>
    <h1>{title}</h1>
    <div class="meta">
        Date: {date}<br>
        Generated by: {generated_by}<br>
        Report ID: {report_id}<br>
        Source: {source} (SHA-256 {fingerprint})
    </div>

    <div class="section">
        <h3>Diagnosis Results</h3>
        <table class="stats-table">
{rows}        </table>
    </div>

    <div class="section image-container">
        <h3>Visual Analysis</h3>
        <img src="data:image/png;base64,{image}" width="500" alt="Annotated MRI slice">
    </div>

    <div class="section">
        <h3>Clinical Findings</h3>
        <ul>
{findings}        </ul>
    </div>
</body>
</html>
"#,
            title = escape(&document.title),
            generated_by = escape(&document.generated_by),
            report_id = escape(&document.report_id),
            source = escape(&document.source_name),
            fingerprint = escape(&document.source_fingerprint),
            image = BASE64.encode(&document.annotated_png),
        );

        Ok(html.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SummaryRow;
    use chrono::TimeZone;

    fn document() -> ExportDocument {
        ExportDocument {
            report_id: "id-1".into(),
            title: "Brain Metastases Diagnostic Report".into(),
            generated_by: "neuroscan".into(),
            generated_at: chrono::Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap(),
            source_name: "slice<1>.png".into(),
            source_fingerprint: "abcd".into(),
            summary: vec![
                SummaryRow::new("Malignancy Probability", "91%"),
                SummaryRow::new("Lesion Count", "3"),
                SummaryRow::new("Diagnosis", "Metastases"),
            ],
            annotated_png: vec![1, 2, 3],
            findings: vec!["Detected 3 lesion(s).".into(), "Primary lesion: A&B".into()],
        }
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let html = String::from_utf8(HtmlReportRenderer::new().render(&document()).unwrap()).unwrap();

        let title = html.find("<h1>Brain Metastases Diagnostic Report</h1>").unwrap();
        let date = html.find("Date: March 4, 2026 09:30 UTC").unwrap();
        let table = html.find("Diagnosis Results").unwrap();
        let image = html.find("data:image/png;base64,AQID").unwrap();
        let findings = html.find("<li>Detected 3 lesion(s).</li>").unwrap();

        assert!(title < date && date < table && table < image && image < findings);
        assert!(html.contains("<td class=\"value\">91%</td>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = String::from_utf8(HtmlReportRenderer::new().render(&document()).unwrap()).unwrap();
        assert!(html.contains("slice&lt;1&gt;.png"));
        assert!(html.contains("<li>Primary lesion: A&amp;B</li>"));
    }

    #[test]
    fn test_missing_image_is_rendering_error() {
        let mut doc = document();
        doc.annotated_png.clear();
        let err = HtmlReportRenderer::new().render(&doc).unwrap_err();
        assert!(matches!(err, ExportError::Rendering(_)));
    }
}
