//! Lifecycle of one image-analysis session.
//!
//! ```text
//! Idle --load--> Loaded --begin--> Analyzing --complete--> Complete
//!                  ^                                          |
//!                  +-------------- load (any state) ----------+
//!                               Complete --begin--> Analyzing
//! ```
//!
//! Every load and every analysis start bumps a generation counter. A
//! completion is applied only when its generation is still current, so a
//! late result from before a reset cannot leak into the new session.

use std::sync::Arc;

use super::detection::Detection;
use super::errors::SessionError;
use super::mri::MriImage;
use super::report::{aggregate, DiagnosticReport};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No image loaded
    Idle,
    /// Image present, no analysis result yet
    Loaded,
    /// Detection job in flight
    Analyzing,
    /// Report available
    Complete,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Loaded => write!(f, "LOADED"),
            Self::Analyzing => write!(f, "ANALYZING"),
            Self::Complete => write!(f, "COMPLETE"),
        }
    }
}

/// Permission to run one detection job for the current image.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub generation: u64,
    pub image: Arc<MriImage>,
}

/// What happened to a delivered completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Detections stored and report rebuilt
    Applied,
    /// Late or foreign completion, ignored
    Stale,
}

/// Per-image analysis state.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    image: Option<Arc<MriImage>>,
    detections: Vec<Detection>,
    report: DiagnosticReport,
    generation: u64,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            image: None,
            detections: Vec::new(),
            report: DiagnosticReport::idle(),
            generation: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn image(&self) -> Option<&Arc<MriImage>> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    #[must_use]
    pub fn report(&self) -> &DiagnosticReport {
        &self.report
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_analyzing(&self) -> bool {
        self.state == SessionState::Analyzing
    }

    /// Replace the session with a freshly loaded image. Legal from any state.
    pub fn load(&mut self, image: MriImage) {
        self.generation += 1;
        self.image = Some(Arc::new(image));
        self.detections.clear();
        self.report = DiagnosticReport::pending();
        self.state = SessionState::Loaded;
    }

    /// Whether `begin_analysis` would be accepted right now.
    ///
    /// # Errors
    /// `NoImage` from `Idle`, `AlreadyAnalyzing` while a job is in flight.
    pub fn can_begin_analysis(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => Err(SessionError::NoImage),
            SessionState::Analyzing => Err(SessionError::AlreadyAnalyzing),
            SessionState::Loaded | SessionState::Complete if self.image.is_none() => Err(SessionError::NoImage),
            SessionState::Loaded | SessionState::Complete => Ok(()),
        }
    }

    /// Enter `Analyzing` and hand out the ticket for the detection job.
    ///
    /// Results of a previous run are cleared, so nothing observed while the
    /// job is in flight belongs to an older analysis.
    ///
    /// # Errors
    /// See [`Self::can_begin_analysis`].
    pub fn begin_analysis(&mut self) -> Result<AnalysisTicket, SessionError> {
        self.can_begin_analysis()?;
        let image = self.image.clone().ok_or(SessionError::NoImage)?;

        self.generation += 1;
        self.detections.clear();
        self.report = DiagnosticReport::pending();
        self.state = SessionState::Analyzing;
        Ok(AnalysisTicket {
            generation: self.generation,
            image,
        })
    }

    /// Apply the result of the job started with `generation`.
    pub fn complete_analysis(&mut self, generation: u64, detections: Vec<Detection>) -> CompletionOutcome {
        if self.state != SessionState::Analyzing || generation != self.generation {
            return CompletionOutcome::Stale;
        }

        self.report = aggregate(&detections);
        self.detections = detections;
        self.state = SessionState::Complete;
        CompletionOutcome::Applied
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoundingBox, Diagnosis};
    use image::DynamicImage;

    fn scan(name: &str) -> MriImage {
        MriImage::new(name, DynamicImage::new_rgb8(8, 8), "00")
    }

    fn lesion(confidence: f32) -> Detection {
        Detection::new("lesion", confidence, BoundingBox::new(1, 1, 4, 4).unwrap())
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.image().is_none());
        assert_eq!(session.report(), &DiagnosticReport::idle());
    }

    #[test]
    fn test_begin_requires_image() {
        let mut session = Session::new();
        assert_eq!(session.begin_analysis().unwrap_err(), SessionError::NoImage);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut session = Session::new();
        session.load(scan("a.png"));
        assert_eq!(session.state(), SessionState::Loaded);

        let ticket = session.begin_analysis().expect("should start");
        assert_eq!(session.state(), SessionState::Analyzing);

        let outcome = session.complete_analysis(ticket.generation, vec![lesion(0.9), lesion(0.5)]);
        assert_eq!(outcome, CompletionOutcome::Applied);
        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.detections().len(), 2);
        assert_eq!(session.report().diagnosis, Diagnosis::Metastases);
    }

    #[test]
    fn test_second_begin_while_analyzing_is_rejected() {
        let mut session = Session::new();
        session.load(scan("a.png"));
        let ticket = session.begin_analysis().unwrap();

        assert_eq!(session.begin_analysis().unwrap_err(), SessionError::AlreadyAnalyzing);
        assert_eq!(session.generation(), ticket.generation);
    }

    #[test]
    fn test_complete_can_rerun() {
        let mut session = Session::new();
        session.load(scan("a.png"));
        let first = session.begin_analysis().unwrap();
        session.complete_analysis(first.generation, vec![]);

        let second = session.begin_analysis().expect("re-run allowed");
        assert!(second.generation > first.generation);
        session.complete_analysis(second.generation, vec![lesion(0.4)]);
        assert_eq!(session.report().diagnosis, Diagnosis::NotMetastases);
    }

    #[test]
    fn test_rerun_clears_previous_results() {
        let mut session = Session::new();
        session.load(scan("a.png"));
        let first = session.begin_analysis().unwrap();
        session.complete_analysis(first.generation, vec![lesion(0.9), lesion(0.8)]);
        assert_eq!(session.report().lesion_count, 2);

        session.begin_analysis().unwrap();
        assert!(session.is_analyzing());
        assert!(session.detections().is_empty());
        assert_eq!(session.report(), &DiagnosticReport::pending());
    }

    #[test]
    fn test_can_begin_does_not_transition() {
        let mut session = Session::new();
        assert_eq!(session.can_begin_analysis(), Err(SessionError::NoImage));

        session.load(scan("a.png"));
        let generation = session.generation();
        assert_eq!(session.can_begin_analysis(), Ok(()));
        assert_eq!(session.state(), SessionState::Loaded);
        assert_eq!(session.generation(), generation);
    }

    #[test]
    fn test_completion_after_reload_is_stale() {
        let mut session = Session::new();
        session.load(scan("a.png"));
        let ticket = session.begin_analysis().unwrap();

        session.load(scan("b.png"));
        let outcome = session.complete_analysis(ticket.generation, vec![lesion(0.99)]);

        assert_eq!(outcome, CompletionOutcome::Stale);
        assert_eq!(session.state(), SessionState::Loaded);
        assert!(session.detections().is_empty());
        assert_eq!(session.report(), &DiagnosticReport::pending());
    }

    #[test]
    fn test_old_completion_rejected_by_new_analysis() {
        let mut session = Session::new();
        session.load(scan("a.png"));
        let old = session.begin_analysis().unwrap();
        session.load(scan("b.png"));
        let current = session.begin_analysis().unwrap();

        assert_eq!(session.complete_analysis(old.generation, vec![lesion(0.9)]), CompletionOutcome::Stale);
        assert!(session.is_analyzing());
        assert_eq!(session.complete_analysis(current.generation, vec![]), CompletionOutcome::Applied);
        assert_eq!(session.report().diagnosis, Diagnosis::Normal);
    }

    #[test]
    fn test_completion_when_not_analyzing_is_stale() {
        let mut session = Session::new();
        session.load(scan("a.png"));
        let generation = session.generation();
        assert_eq!(session.complete_analysis(generation, vec![lesion(0.7)]), CompletionOutcome::Stale);
        assert_eq!(session.state(), SessionState::Loaded);
    }
}
