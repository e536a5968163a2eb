//! Neuroscan: Brain Metastases Detection
//!
//! Main entry point for the terminal application.
//!
//! Usage: `neuroscan [IMAGE]` opens `IMAGE` on startup.

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use neuroscan::adapters::sanitize::SanitizingMakeWriter;
use neuroscan::config::Settings;
use neuroscan::tui::App;

fn main() -> Result<()> {
    // Settings pick the log destination, so they are read first and any
    // ignored values are logged once the subscriber is up.
    let (settings, ignored_settings) = Settings::from_env();

    // Initialize logging.
    //
    // IMPORTANT: writing logs to the terminal will corrupt the TUI (alternate screen).
    // Default behavior:
    // - interactive TTY: log to a file
    // - non-interactive: log to stdout
    let interactive = std::io::stdout().is_terminal();

    let (writer, _guard) = if settings.log_mode.use_file(interactive) {
        if let Some(parent) = settings.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)
            .with_context(|| format!("Cannot open log file {:?}", settings.log_file))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Neuroscan...");
    for message in &ignored_settings {
        tracing::warn!("{}", message);
    }

    let initial_image = std::env::args_os().nth(1).map(PathBuf::from);

    let mut app = App::new(settings);
    app.run(initial_image)?;

    tracing::info!("Neuroscan shutdown complete.");
    Ok(())
}
