//! Color palette and preset styles for the screening shell.
//!
//! Diagnosis colors come from `Diagnosis::color`, so the TUI and any other
//! front end agree on them.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::Diagnosis;

/// Palette for the screening shell.
pub struct MedicalTheme;

impl MedicalTheme {
    /// Teal accent for focus and active borders
    pub const ACCENT: Color = Color::Rgb(13, 148, 136); // #0D9488

    /// Bright teal for headings and key hints
    pub const ACCENT_BRIGHT: Color = Color::Rgb(45, 212, 191); // #2DD4BF

    /// Slate for inactive borders
    pub const OUTLINE: Color = Color::Rgb(148, 163, 184); // #94A3B8

    pub const SUCCESS: Color = Color::Rgb(16, 185, 129); // #10B981
    pub const WARNING: Color = Color::Rgb(251, 191, 36); // #FBBF24
    pub const DANGER: Color = Color::Rgb(244, 63, 94); // #F43F5E
    pub const INFO: Color = Color::Rgb(59, 130, 246); // #3B82F6

    /// Same red as the outlines drawn into exported images
    pub const LESION: Color = Color::Rgb(255, 0, 0);

    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Panel titles
    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::ACCENT_BRIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    /// Field labels
    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Placeholders and separators
    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::INFO)
    }

    /// Box coordinates in the detections table
    #[must_use]
    pub fn lesion() -> Style {
        Style::default().fg(Self::LESION)
    }

    /// Prompt cursor and finding bullets
    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::ACCENT_BRIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::OUTLINE)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::ACCENT)
    }

    /// Toolbar key, e.g. `[R]`
    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::ACCENT_BRIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Toolbar action label
    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn diagnosis(diagnosis: Diagnosis) -> Style {
        let (r, g, b) = diagnosis.color();
        Style::default().fg(Color::Rgb(r, g, b)).add_modifier(Modifier::BOLD)
    }

    /// Gauge color for a malignancy probability in `[0,1]`.
    #[must_use]
    pub fn probability_gauge(probability: f64) -> Style {
        if probability >= 0.7 {
            Self::danger()
        } else if probability >= 0.3 {
            Self::warning()
        } else {
            Self::success()
        }
    }
}

/// Inline application name
pub const LOGO_SMALL: &str = "Neuroscan";
