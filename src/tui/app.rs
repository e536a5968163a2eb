//! Main TUI application.
//!
//! Handles:
//! - Input event handling and the path prompt
//! - Service integration (load, analyze, export)
//! - Polling detection jobs from the draw loop

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::html::HtmlReportRenderer;
use crate::adapters::imaging::ImageRsCodec;
use crate::adapters::pdf::PdfReportRenderer;
use crate::application::{AnalysisEvent, AnalysisService, DetectionModel, ReportExporter};
use crate::config::{ReportFormat, Settings};
use crate::domain::SessionError;
use crate::ports::DocumentRenderer;
use crate::{NeuroscanError, Result};

use super::ui::{
    prompt::{render_prompt, PromptKind, PromptState},
    render_disclaimer, render_header, render_status, render_toolbar,
    report::{render_report, ReportContext},
    viewport::render_viewport,
    StatusMessage,
};

/// Main application state
pub struct App {
    settings: Settings,

    /// Whether the app should quit
    should_quit: bool,

    /// Session owner; completions are applied from the draw loop
    service: AnalysisService<ImageRsCodec>,

    exporter: ReportExporter<ImageRsCodec, dyn DocumentRenderer>,

    /// Open path prompt, if any
    prompt: Option<PromptState>,

    /// Last status line message
    status: Option<StatusMessage>,
}

impl App {
    /// Create a new application instance, loading the detection model.
    ///
    /// A model that fails to load does not prevent startup; the app runs with
    /// detection disabled and says so.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let model = DetectionModel::load_onnx(&settings.model_dir, &settings.weights, settings.intra_threads);
        match model.name() {
            Some(name) => tracing::info!("Detection model '{}' loaded", name),
            None => tracing::warn!("Running without a detection model; reports will show no findings"),
        }

        Self::with_dependencies(settings, Arc::new(model))
    }

    /// Create application with an injected model (Composition Root pattern).
    #[must_use]
    pub fn with_dependencies(settings: Settings, model: Arc<DetectionModel>) -> Self {
        let codec = Arc::new(ImageRsCodec::new());
        let service = AnalysisService::new(model, Arc::clone(&codec))
            .with_confidence_threshold(settings.confidence_threshold);
        let renderer: Arc<dyn DocumentRenderer> = match settings.report_format {
            ReportFormat::Pdf => Arc::new(PdfReportRenderer::new()),
            ReportFormat::Html => Arc::new(HtmlReportRenderer::new()),
        };
        let exporter = ReportExporter::new(codec, renderer);

        let status = if service.model_ready() {
            None
        } else {
            Some(StatusMessage::warning(
                "Detection model unavailable; analyses will report no findings",
            ))
        };

        Self {
            settings,
            should_quit: false,
            service,
            exporter,
            prompt: None,
            status,
        }
    }

    /// Run the main application loop, optionally opening `initial_image` first.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self, initial_image: Option<PathBuf>) -> Result<()> {
        if let Some(path) = initial_image {
            let outcome = self.open_image(&path);
            self.show(outcome);
        }

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_analysis();

            terminal.draw(|f| {
                let area = f.area();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(2), // Header
                        Constraint::Length(1), // Toolbar
                        Constraint::Length(1), // Status
                        Constraint::Min(0),    // Panels
                        Constraint::Length(3), // Disclaimer
                    ])
                    .split(area);

                let session = self.service.session();
                let analyzing = session.is_analyzing();

                render_header(f, chunks[0], session.state(), self.service.model_ready());
                render_toolbar(f, chunks[1], analyzing, self.settings.sample_image.is_some());
                render_status(f, chunks[2], self.status.as_ref());

                let panels = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .split(chunks[3]);

                render_viewport(f, panels[0], session.image().map(Arc::as_ref), session.detections());
                render_report(
                    f,
                    panels[1],
                    session.report(),
                    ReportContext {
                        analyzing,
                        model_unavailable: self.service.model().unavailable_reason(),
                    },
                );

                render_disclaimer(f, chunks[4]);

                if let Some(prompt) = &self.prompt {
                    render_prompt(f, area, prompt);
                }
            })?;

            // Handle input (short poll to stay responsive)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Apply finished detection jobs to the session.
    fn poll_analysis(&mut self) {
        for event in self.service.poll() {
            self.on_analysis_event(event);
        }
    }

    fn on_analysis_event(&mut self, event: AnalysisEvent) {
        match event {
            AnalysisEvent::Completed { error: Some(e), .. } => {
                self.status = Some(StatusMessage::warning(format!("Analysis produced no findings: {e}")));
            }
            AnalysisEvent::Completed { lesion_count, .. } => {
                self.status = Some(StatusMessage::success(format!(
                    "Analysis complete: {lesion_count} lesion(s) detected"
                )));
            }
            AnalysisEvent::Discarded { .. } => {}
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        match key {
            KeyCode::Char('o') | KeyCode::Char('O') => {
                self.prompt = Some(PromptState::new(PromptKind::OpenImage, ""));
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                let outcome = self.load_sample();
                self.show(outcome);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let outcome = self.start_analysis();
                self.show(outcome);
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                let default = self.settings.export_dir.join(self.exporter.default_file_name());
                self.prompt = Some(PromptState::new(
                    PromptKind::ExportReport,
                    default.display().to_string(),
                ));
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyCode) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };

        match key {
            KeyCode::Esc => {
                self.prompt = None;
            }
            KeyCode::Char(c) => prompt.input_char(c),
            KeyCode::Backspace => prompt.delete_char(),
            KeyCode::Delete => prompt.clear(),
            KeyCode::Enter => {
                let kind = prompt.kind;
                let Some(value) = prompt.value().map(PathBuf::from) else {
                    return;
                };
                self.prompt = None;

                let outcome = match kind {
                    PromptKind::OpenImage => self.open_image(&value),
                    PromptKind::ExportReport => self.export_report(&value),
                };
                self.show(outcome);
            }
            _ => {}
        }
    }

    /// Put the outcome of a user action on the status line.
    fn show(&mut self, outcome: Result<StatusMessage>) {
        self.status = match outcome {
            Ok(message) => Some(message),
            // The toolbar already shows the running analysis.
            Err(NeuroscanError::Session(SessionError::AlreadyAnalyzing)) => return,
            Err(NeuroscanError::Session(SessionError::NoImage)) => {
                Some(StatusMessage::warning("Please load an image first."))
            }
            Err(NeuroscanError::Session(e @ SessionError::WorkerBusy)) => {
                Some(StatusMessage::warning(format!("{e}; try again in a moment")))
            }
            Err(e) => Some(StatusMessage::error(e.to_string())),
        };
    }

    fn open_image(&mut self, path: &Path) -> Result<StatusMessage> {
        self.service.load_image(path)?;
        let name = self
            .service
            .session()
            .image()
            .map(|i| i.display_name())
            .unwrap_or_default();
        Ok(StatusMessage::info(format!("Loaded {name}")))
    }

    fn load_sample(&mut self) -> Result<StatusMessage> {
        match self.settings.sample_image.clone() {
            Some(path) => self.open_image(&path),
            None => Ok(StatusMessage::warning(
                "No sample image configured (set NEUROSCAN_SAMPLE_IMAGE)",
            )),
        }
    }

    fn start_analysis(&mut self) -> Result<StatusMessage> {
        self.service.start_analysis()?;
        Ok(StatusMessage::info("Analyzing..."))
    }

    fn export_report(&mut self, destination: &Path) -> Result<StatusMessage> {
        let path = self.exporter.export_to(self.service.session(), destination)?;
        Ok(StatusMessage::success(format!("Report saved to {}", path.display())))
    }
}
