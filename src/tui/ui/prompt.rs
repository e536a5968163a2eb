//! Single-line path prompt shown as a popup.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::tui::styles::MedicalTheme;

/// What the entered path will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    OpenImage,
    ExportReport,
}

impl PromptKind {
    fn title(self) -> &'static str {
        match self {
            Self::OpenImage => " Open MRI Image ",
            Self::ExportReport => " Export Report ",
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Self::OpenImage => "Path to a PNG, JPEG, BMP or TIFF slice",
            Self::ExportReport => "Destination file or directory",
        }
    }
}

/// Prompt state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptState {
    pub kind: PromptKind,
    pub input: String,
}

impl PromptState {
    #[must_use]
    pub fn new(kind: PromptKind, initial: impl Into<String>) -> Self {
        Self {
            kind,
            input: initial.into(),
        }
    }

    pub fn input_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn delete_char(&mut self) {
        self.input.pop();
    }

    pub fn clear(&mut self) {
        self.input.clear();
    }

    /// Trimmed input, or `None` if blank.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        let value = self.input.trim();
        (!value.is_empty()).then_some(value)
    }
}

fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}

/// Render the prompt over whatever is below it.
pub fn render_prompt(f: &mut Frame, area: Rect, state: &PromptState) {
    let popup = centered(area, 70, 6);
    f.render_widget(Clear, popup);

    let content = Paragraph::new(vec![
        Line::from(Span::styled(state.kind.hint(), MedicalTheme::text_muted())),
        Line::from(vec![
            Span::styled("> ", MedicalTheme::focused()),
            Span::styled(state.input.as_str(), MedicalTheme::text()),
            Span::styled("_", MedicalTheme::focused()),
        ]),
        Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Confirm ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Cancel", MedicalTheme::key_desc()),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(state.kind.title(), MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border_focused()),
    );

    f.render_widget(content, popup);
}
