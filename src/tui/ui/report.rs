//! Diagnostic report panel.
//!
//! Renders the fields of `DiagnosticReport` as-is; no values are computed here.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};

use crate::domain::DiagnosticReport;
use crate::tui::styles::MedicalTheme;

/// What the report panel needs besides the report itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportContext<'a> {
    pub analyzing: bool,
    /// Set when the detection model failed to load
    pub model_unavailable: Option<&'a str>,
}

/// Render the diagnostic report panel.
pub fn render_report(f: &mut Frame, area: Rect, report: &DiagnosticReport, ctx: ReportContext<'_>) {
    let block = Block::default()
        .title(Span::styled(" Diagnostic Report ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(if ctx.analyzing {
            MedicalTheme::warning()
        } else {
            MedicalTheme::border_focused()
        });

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Probability
            Constraint::Length(3), // Count + diagnosis
            Constraint::Min(0),    // Findings
            Constraint::Length(2), // Model notice
        ])
        .margin(1)
        .split(inner);

    let probability = f64::from(report.probability_percent) / 100.0;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Malignancy Probability ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::probability_gauge(probability))
        .percent(u16::from(report.probability_percent.min(100)))
        .label(format!("{}%", report.probability_percent));
    f.render_widget(gauge, chunks[0]);

    let summary = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Lesion Count: ", MedicalTheme::text_secondary()),
            Span::styled(report.lesion_count.to_string(), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("Diagnosis: ", MedicalTheme::text_secondary()),
            Span::styled(report.diagnosis.to_string(), MedicalTheme::diagnosis(report.diagnosis)),
            Span::styled(format!("  {}", report.diagnosis.description()), MedicalTheme::text_muted()),
        ]),
    ]);
    f.render_widget(summary, chunks[1]);

    render_findings(f, chunks[2], report, ctx.analyzing);

    if let Some(reason) = ctx.model_unavailable {
        let notice = Paragraph::new(Line::from(vec![
            Span::styled("! Detection model unavailable: ", MedicalTheme::danger()),
            Span::styled(reason, MedicalTheme::text_muted()),
        ]))
        .alignment(Alignment::Left);
        f.render_widget(notice, chunks[3]);
    }
}

fn render_findings(f: &mut Frame, area: Rect, report: &DiagnosticReport, analyzing: bool) {
    let block = Block::default()
        .title(Span::styled(" Clinical Findings ", MedicalTheme::text_secondary()))
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    if analyzing {
        let busy = Paragraph::new(Span::styled("Analyzing...", MedicalTheme::warning()))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(busy, area);
        return;
    }

    let items: Vec<ListItem> = report
        .findings
        .iter()
        .map(|finding| {
            ListItem::new(Line::from(vec![
                Span::styled("• ", MedicalTheme::focused()),
                Span::styled(finding.as_str(), MedicalTheme::text()),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}
