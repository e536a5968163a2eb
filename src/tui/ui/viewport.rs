//! Viewport panel: the loaded image and its detections.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::domain::{Detection, MriImage, LOAD_IMAGE_PROMPT};
use crate::tui::styles::MedicalTheme;

/// Render the viewport for the current image (if any).
pub fn render_viewport(f: &mut Frame, area: Rect, image: Option<&MriImage>, detections: &[Detection]) {
    let block = Block::default()
        .title(Span::styled(" Viewport ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(image) = image else {
        render_empty(f, inner);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Image info
            Constraint::Min(0),    // Detections
        ])
        .margin(1)
        .split(inner);

    render_image_info(f, chunks[0], image);
    render_detections(f, chunks[1], detections);
}

fn render_empty(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("No Image Loaded", MedicalTheme::text_secondary())),
        Line::from(""),
        Line::from(Span::styled(LOAD_IMAGE_PROMPT, MedicalTheme::text_muted())),
    ])
    .alignment(Alignment::Center);

    f.render_widget(content, area);
}

fn render_image_info(f: &mut Frame, area: Rect, image: &MriImage) {
    let short: String = image.fingerprint().chars().take(16).collect();

    let info = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("File: ", MedicalTheme::text_secondary()),
            Span::styled(image.display_name(), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("Size: ", MedicalTheme::text_secondary()),
            Span::styled(format!("{} x {} px", image.width(), image.height()), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("SHA-256: ", MedicalTheme::text_secondary()),
            Span::styled(format!("{short}…"), MedicalTheme::text_muted()),
        ]),
    ]);

    f.render_widget(info, area);
}

fn render_detections(f: &mut Frame, area: Rect, detections: &[Detection]) {
    if detections.is_empty() {
        let empty = Paragraph::new(Span::styled("No detections to display", MedicalTheme::text_muted()));
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec!["#", "Label", "Confidence", "Box (x1, y1, x2, y2)"]).style(MedicalTheme::subtitle());

    let rows = detections.iter().enumerate().map(|(i, d)| {
        Row::new(vec![
            Cell::from((i + 1).to_string()),
            Cell::from(d.label.clone()),
            Cell::from(format!("{:.1}%", f64::from(d.confidence) * 100.0)),
            Cell::from(Span::styled(d.bbox.to_string(), MedicalTheme::lesion())),
        ])
        .style(MedicalTheme::text())
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(11),
            Constraint::Min(22),
        ],
    )
    .header(header);

    f.render_widget(table, area);
}
