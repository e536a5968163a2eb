//! Single-page A4 PDF report renderer.
//!
//! Text is set in the standard Helvetica faces, so no font program is
//! embedded. The annotated slice goes in as an RGB image XObject scaled to
//! fit between the results table and the findings list.

use image::ImageFormat;
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::domain::{ExportDocument, ExportError};
use crate::ports::DocumentRenderer;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const IMAGE_MAX_WIDTH: f32 = 360.0;
const IMAGE_MIN_HEIGHT: f32 = 40.0;
const FINDING_LINE: f32 = 16.0;
const SECTION_GAP: f32 = 28.0;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");
const SLICE: Name<'static> = Name(b"Im1");

/// Renders reports as a one-page PDF.
#[derive(Debug, Clone, Default)]
pub struct PdfReportRenderer;

impl PdfReportRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Standard fonts only cover single-byte text; anything outside printable
/// ASCII becomes `?`.
fn pdf_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
        .collect()
}

/// Content stream plus the current baseline, top to bottom.
struct PageWriter {
    content: Content,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            content: Content::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn text_at(&mut self, font: Name<'_>, size: f32, x: f32, text: &str) {
        self.content.begin_text();
        self.content.set_font(font, size);
        self.content.next_line(x, self.y);
        self.content.show(Str(&pdf_text(text)));
        self.content.end_text();
    }

    fn line(&mut self, font: Name<'_>, size: f32, advance: f32, text: &str) {
        self.y -= advance;
        self.text_at(font, size, MARGIN, text);
    }

    fn heading(&mut self, text: &str) {
        self.content.set_fill_rgb(0.12, 0.16, 0.23);
        self.line(BOLD, 14.0, SECTION_GAP, text);
        self.content.set_fill_rgb(0.2, 0.2, 0.2);
    }

    fn rule(&mut self, width: f32, gray: f32) {
        self.content.set_line_width(width);
        self.content.set_stroke_gray(gray);
        self.content.move_to(MARGIN, self.y);
        self.content.line_to(PAGE_WIDTH - MARGIN, self.y);
        self.content.stroke();
    }
}

impl DocumentRenderer for PdfReportRenderer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
        if document.annotated_png.is_empty() {
            return Err(ExportError::Rendering("document has no image".into()));
        }

        let slice = image::load_from_memory_with_format(&document.annotated_png, ImageFormat::Png)
            .map_err(|e| ExportError::Rendering(format!("cannot decode annotated image: {e}")))?
            .to_rgb8();
        let (width, height) = slice.dimensions();
        let pixel_width = i32::try_from(width).map_err(|_| ExportError::Rendering("image too wide".into()))?;
        let pixel_height = i32::try_from(height).map_err(|_| ExportError::Rendering("image too tall".into()))?;

        let mut page = PageWriter::new();

        page.content.set_fill_rgb(0.12, 0.16, 0.23);
        page.line(BOLD, 20.0, 20.0, &document.title);
        page.y -= 10.0;
        page.rule(1.5, 0.2);

        page.content.set_fill_rgb(0.39, 0.45, 0.55);
        let date = document.generated_at.format("%B %-d, %Y %H:%M UTC").to_string();
        page.line(REGULAR, 10.0, 16.0, &format!("Date: {date}"));
        page.line(REGULAR, 10.0, 14.0, &format!("Generated by: {}", document.generated_by));
        page.line(REGULAR, 10.0, 14.0, &format!("Report ID: {}", document.report_id));
        page.line(REGULAR, 10.0, 14.0, &format!("Source: {}", document.source_name));
        page.line(REGULAR, 8.0, 12.0, &format!("SHA-256 {}", document.source_fingerprint));

        page.heading("Diagnosis Results");
        for row in &document.summary {
            page.y -= 20.0;
            page.text_at(BOLD, 11.0, MARGIN + 8.0, &row.label);
            page.text_at(REGULAR, 11.0, MARGIN + 220.0, &row.value);
            page.y -= 7.0;
            page.rule(0.5, 0.85);
        }

        page.heading("Visual Analysis");
        let findings_height = SECTION_GAP + FINDING_LINE * document.findings.len() as f32 + MARGIN;
        let available = (page.y - 14.0 - findings_height).max(IMAGE_MIN_HEIGHT);
        let scale = (IMAGE_MAX_WIDTH / width as f32).min(available / height as f32);
        let (draw_w, draw_h) = (width as f32 * scale, height as f32 * scale);
        let x = (PAGE_WIDTH - draw_w) / 2.0;
        let y = page.y - 14.0 - draw_h;

        page.content.save_state();
        page.content.transform([draw_w, 0.0, 0.0, draw_h, x, y]);
        page.content.x_object(SLICE);
        page.content.restore_state();
        page.content.set_line_width(0.5);
        page.content.set_stroke_gray(0.8);
        page.content.rect(x - 5.0, y - 5.0, draw_w + 10.0, draw_h + 10.0);
        page.content.stroke();
        page.y = y - 5.0;

        page.heading("Clinical Findings");
        for finding in &document.findings {
            page.y -= FINDING_LINE;
            page.content.rect(MARGIN + 8.0, page.y + 3.0, 3.0, 3.0);
            page.content.fill_nonzero();
            page.text_at(REGULAR, 11.0, MARGIN + 20.0, finding);
        }

        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let page_id = Ref::new(3);
        let regular_id = Ref::new(4);
        let bold_id = Ref::new(5);
        let content_id = Ref::new(6);
        let image_id = Ref::new(7);
        let info_id = Ref::new(8);

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id).kids([page_id]).count(1);

        let mut pdf_page = pdf.page(page_id);
        pdf_page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        pdf_page.parent(page_tree_id);
        pdf_page.contents(content_id);
        let mut resources = pdf_page.resources();
        resources.fonts().pair(REGULAR, regular_id).pair(BOLD, bold_id);
        resources.x_objects().pair(SLICE, image_id);
        resources.finish();
        pdf_page.finish();

        pdf.type1_font(regular_id).base_font(Name(b"Helvetica"));
        pdf.type1_font(bold_id).base_font(Name(b"Helvetica-Bold"));
        pdf.stream(content_id, &page.content.finish());

        let mut xobject = pdf.image_xobject(image_id, slice.as_raw());
        xobject.width(pixel_width);
        xobject.height(pixel_height);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        xobject.finish();

        pdf.document_info(info_id)
            .title(TextStr(&document.title))
            .producer(TextStr(&document.generated_by));

        Ok(pdf.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SummaryRow;
    use chrono::TimeZone;
    use image::DynamicImage;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn document() -> ExportDocument {
        ExportDocument {
            report_id: "id-1".into(),
            title: "Brain Metastases Diagnostic Report".into(),
            generated_by: "neuroscan".into(),
            generated_at: chrono::Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap(),
            source_name: "slice_\u{fc}.png".into(),
            source_fingerprint: "abcd".into(),
            summary: vec![
                SummaryRow::new("Malignancy Probability", "91%"),
                SummaryRow::new("Lesion Count", "3"),
                SummaryRow::new("Diagnosis", "Metastases"),
            ],
            annotated_png: png(4, 3),
            findings: vec!["Detected 3 lesion(s).".into(), "Primary lesion: A".into()],
        }
    }

    fn find(haystack: &[u8], needle: &str) -> usize {
        haystack
            .windows(needle.len())
            .position(|w| w == needle.as_bytes())
            .unwrap_or_else(|| panic!("{needle:?} not found"))
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let pdf = PdfReportRenderer::new().render(&document()).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));

        let title = find(&pdf, "Brain Metastases Diagnostic Report");
        let date = find(&pdf, "Date: March 4, 2026 09:30 UTC");
        let table = find(&pdf, "Diagnosis Results");
        let image = find(&pdf, "/Im1 Do");
        let findings = find(&pdf, "Clinical Findings");
        let first = find(&pdf, "Detected 3 lesion");

        assert!(title < date && date < table && table < image && image < findings && findings < first);
        find(&pdf, "91%");
        find(&pdf, "Metastases");
    }

    #[test]
    fn test_image_embedded_at_source_size() {
        let pdf = PdfReportRenderer::new().render(&document()).unwrap();
        find(&pdf, "/Width 4");
        find(&pdf, "/Height 3");
        find(&pdf, "/DeviceRGB");
        find(&pdf, "/Helvetica-Bold");
    }

    #[test]
    fn test_non_ascii_text_is_replaced() {
        let pdf = PdfReportRenderer::new().render(&document()).unwrap();
        find(&pdf, "Source: slice_?.png");
        assert_eq!(pdf_text("a\u{2022}b\n"), b"a?b?".to_vec());
    }

    #[test]
    fn test_missing_image_is_rendering_error() {
        let mut doc = document();
        doc.annotated_png.clear();
        assert!(matches!(
            PdfReportRenderer::new().render(&doc),
            Err(ExportError::Rendering(_))
        ));

        doc.annotated_png = b"not a png".to_vec();
        assert!(matches!(
            PdfReportRenderer::new().render(&doc),
            Err(ExportError::Rendering(_))
        ));
    }
}
