//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a medical-themed interface with:
//! - Viewport listing the loaded slice and its detections
//! - Diagnostic report panel
//! - Path prompts for opening images and exporting reports

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
