//! UI module: View components for the TUI.

pub mod prompt;
pub mod report;
pub mod viewport;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::SessionState;
use crate::tui::styles::{MedicalTheme, LOGO_SMALL};

/// Severity of the status line message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One-line feedback shown under the toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

pub fn render_header(f: &mut Frame, area: Rect, state: SessionState, model_ready: bool) {
    let model = if model_ready {
        Span::styled("Model: ready", MedicalTheme::success())
    } else {
        Span::styled("Model: unavailable", MedicalTheme::danger())
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled(LOGO_SMALL, MedicalTheme::title()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled("Brain Metastases Detection", MedicalTheme::text_secondary()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        model,
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled(format!("Session: {state}"), MedicalTheme::info()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// Key hints; the run action is replaced by "Analyzing..." while a job runs.
pub fn render_toolbar(f: &mut Frame, area: Rect, analyzing: bool, sample_configured: bool) {
    let mut spans = vec![
        Span::styled("[O] ", MedicalTheme::key_hint()),
        Span::styled("Open Image  ", MedicalTheme::key_desc()),
    ];

    if sample_configured {
        spans.push(Span::styled("[S] ", MedicalTheme::key_hint()));
        spans.push(Span::styled("Load Sample  ", MedicalTheme::key_desc()));
    }

    if analyzing {
        spans.push(Span::styled("Analyzing...  ", MedicalTheme::warning()));
    } else {
        spans.push(Span::styled("[R] ", MedicalTheme::key_hint()));
        spans.push(Span::styled("Run Diagnosis  ", MedicalTheme::key_desc()));
    }

    spans.push(Span::styled("[E] ", MedicalTheme::key_hint()));
    spans.push(Span::styled("Export Report  ", MedicalTheme::key_desc()));
    spans.push(Span::styled("[Q] ", MedicalTheme::key_hint()));
    spans.push(Span::styled("Quit", MedicalTheme::key_desc()));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn render_status(f: &mut Frame, area: Rect, status: Option<&StatusMessage>) {
    let Some(status) = status else {
        return;
    };

    let style = match status.level {
        StatusLevel::Info => MedicalTheme::info(),
        StatusLevel::Success => MedicalTheme::success(),
        StatusLevel::Warning => MedicalTheme::warning(),
        StatusLevel::Error => MedicalTheme::danger(),
    };

    f.render_widget(Paragraph::new(Line::from(Span::styled(status.text.as_str(), style))), area);
}

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: This tool provides indicative findings and does not replace review by a radiologist.",
            MedicalTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "The detector tends toward false positives.",
            MedicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
