//! Analysis service: owns the session and drives detection jobs.
//!
//! The service lives on the interactive thread. Jobs run on the
//! `DetectionRunner`; their completions are only applied here, in `poll`
//! or `wait_for_idle`, so the session is never touched by a worker.

use std::path::Path;
use std::sync::Arc;

use crate::config::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::domain::{CompletionOutcome, ImageDecodeError, Session, SessionError};
use crate::ports::ImageCodec;

use super::detection::DetectionModel;
use super::runner::{DetectionCompletion, DetectionJob, DetectionRunner};

/// Something that happened while applying job completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisEvent {
    /// A current job finished and the report was rebuilt
    Completed {
        generation: u64,
        lesion_count: usize,
        error: Option<String>,
    },
    /// A job from a superseded session finished and was ignored
    Discarded { generation: u64 },
}

/// Service for loading images and running lesion detection on them.
pub struct AnalysisService<C>
where
    C: ImageCodec,
{
    session: Session,
    runner: DetectionRunner,
    codec: Arc<C>,
    jobs: Vec<DetectionJob>,
    confidence_threshold: f32,
    last_error: Option<String>,
}

impl<C> AnalysisService<C>
where
    C: ImageCodec,
{
    /// Create a new service with an empty session.
    pub fn new(model: Arc<DetectionModel>, codec: Arc<C>) -> Self {
        Self {
            session: Session::new(),
            runner: DetectionRunner::new(model),
            codec,
            jobs: Vec::new(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            last_error: None,
        }
    }

    /// Override the detection confidence threshold.
    #[must_use]
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn codec(&self) -> &Arc<C> {
        &self.codec
    }

    #[must_use]
    pub fn model(&self) -> &Arc<DetectionModel> {
        self.runner.model()
    }

    #[must_use]
    pub fn model_ready(&self) -> bool {
        self.runner.model().is_ready()
    }

    #[must_use]
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Error reported by the most recent applied completion, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of jobs whose completion has not been collected yet.
    #[must_use]
    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Decode `path` and reset the session around it.
    ///
    /// # Errors
    /// Returns `ImageDecodeError` if the file cannot be read or decoded; the
    /// session is left exactly as it was.
    pub fn load_image(&mut self, path: &Path) -> Result<(), ImageDecodeError> {
        let image = match self.codec.load(path) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Image load failed: {}", e);
                return Err(e);
            }
        };

        tracing::info!(
            "Loaded {} ({}x{}, sha256 {})",
            image.display_name(),
            image.width(),
            image.height(),
            image.fingerprint()
        );

        if self.session.is_analyzing() {
            tracing::info!(
                "Session reset while generation {} is in flight; its result will be discarded",
                self.session.generation()
            );
        }

        self.session.load(image);
        self.last_error = None;
        Ok(())
    }

    /// Start detection on the loaded image.
    ///
    /// Returns the generation of the submitted job.
    ///
    /// # Errors
    /// `NoImage` before any image is loaded, `AlreadyAnalyzing` while a job
    /// for this session is in flight, `WorkerBusy` while a job from before
    /// the last image load is still running. No job is submitted in any of
    /// these cases.
    pub fn start_analysis(&mut self) -> Result<u64, SessionError> {
        if let Err(e) = self.session.can_begin_analysis() {
            tracing::debug!("Analysis request rejected: {}", e);
            return Err(e);
        }

        // Only superseded jobs can be outstanding here; collect the finished ones.
        for completion in self.collect_finished() {
            self.apply(completion);
        }
        if let Some(job) = self.jobs.first() {
            tracing::info!(
                "Analysis request rejected: detection for generation {} is still running",
                job.generation()
            );
            return Err(SessionError::WorkerBusy);
        }

        let ticket = self.session.begin_analysis()?;

        if !self.model_ready() {
            tracing::warn!("Starting analysis without a detection model; the report will be empty");
        }

        tracing::info!(
            "Starting analysis of {} (generation {})",
            ticket.image.display_name(),
            ticket.generation
        );

        let job = self
            .runner
            .submit(ticket.image, self.confidence_threshold, ticket.generation);
        self.jobs.push(job);
        Ok(ticket.generation)
    }

    /// Collect finished jobs and apply their results (non-blocking).
    pub fn poll(&mut self) -> Vec<AnalysisEvent> {
        self.collect_finished()
            .into_iter()
            .map(|c| self.apply(c))
            .collect()
    }

    /// Block until every submitted job has finished, applying each result.
    pub fn wait_for_idle(&mut self) -> Vec<AnalysisEvent> {
        let completions: Vec<DetectionCompletion> = self.jobs.drain(..).filter_map(|mut job| job.wait()).collect();

        completions.into_iter().map(|c| self.apply(c)).collect()
    }

    fn collect_finished(&mut self) -> Vec<DetectionCompletion> {
        let mut completions = Vec::new();
        for job in &mut self.jobs {
            job.poll(|completion| completions.push(completion));
        }
        self.jobs.retain(|job| !job.is_delivered());
        completions
    }

    fn apply(&mut self, completion: DetectionCompletion) -> AnalysisEvent {
        let DetectionCompletion {
            generation,
            detections,
            error,
        } = completion;
        let lesion_count = detections.len();

        match self.session.complete_analysis(generation, detections) {
            CompletionOutcome::Applied => {
                let report = self.session.report();
                tracing::info!(
                    "Analysis complete: {} lesion(s), diagnosis {}, max confidence {}%",
                    report.lesion_count,
                    report.diagnosis,
                    report.probability_percent
                );
                self.last_error = error.clone();
                AnalysisEvent::Completed {
                    generation,
                    lesion_count,
                    error,
                }
            }
            CompletionOutcome::Stale => {
                tracing::debug!("Discarded stale completion for generation {}", generation);
                AnalysisEvent::Discarded { generation }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::imaging::ImageRsCodec;
    use crate::domain::{BoundingBox, Detection, Diagnosis, InferenceError, MriImage, SessionState};
    use crate::ports::DetectionEngine;
    use image::{DynamicImage, ImageFormat};
    use std::path::PathBuf;

    struct FixedEngine(Vec<Detection>);

    impl DetectionEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        fn infer(&self, _image: &MriImage, _threshold: f32) -> Result<Vec<Detection>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        DynamicImage::new_rgb8(32, 32)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    fn service(detections: Vec<Detection>) -> AnalysisService<ImageRsCodec> {
        AnalysisService::new(
            Arc::new(DetectionModel::from_engine(FixedEngine(detections))),
            Arc::new(ImageRsCodec::new()),
        )
    }

    #[test]
    fn test_start_without_image_is_rejected() {
        let mut svc = service(Vec::new());
        assert_eq!(svc.start_analysis(), Err(SessionError::NoImage));
        assert_eq!(svc.pending_jobs(), 0);
        assert_eq!(svc.session().state(), SessionState::Idle);
    }

    #[test]
    fn test_failed_load_leaves_session_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut svc = service(Vec::new());
        svc.load_image(&write_png(dir.path(), "a.png")).unwrap();
        let generation = svc.session().generation();

        assert!(svc.load_image(&dir.path().join("missing.png")).is_err());
        assert_eq!(svc.session().state(), SessionState::Loaded);
        assert_eq!(svc.session().generation(), generation);
        assert_eq!(svc.session().image().unwrap().display_name(), "a.png");
    }

    #[test]
    fn test_completion_applied_on_wait() {
        let dir = tempfile::tempdir().unwrap();
        let boxes = BoundingBox::new(1, 1, 5, 5).unwrap();
        let mut svc = service(vec![Detection::new("metastasis", 0.42, boxes)]);
        svc.load_image(&write_png(dir.path(), "a.png")).unwrap();

        let generation = svc.start_analysis().unwrap();
        assert!(svc.session().is_analyzing());

        let events = svc.wait_for_idle();
        assert_eq!(
            events,
            vec![AnalysisEvent::Completed {
                generation,
                lesion_count: 1,
                error: None
            }]
        );
        assert_eq!(svc.session().state(), SessionState::Complete);
        assert_eq!(svc.session().report().diagnosis, Diagnosis::NotMetastases);
        assert_eq!(svc.session().report().probability_percent, 42);
        assert_eq!(svc.pending_jobs(), 0);
    }

    #[test]
    fn test_start_is_refused_while_superseded_job_runs() {
        use std::sync::mpsc::{self, Receiver};
        use std::sync::Mutex;

        struct GatedEngine(Mutex<Receiver<()>>);

        impl DetectionEngine for GatedEngine {
            fn name(&self) -> &str {
                "gated"
            }

            fn infer(&self, _image: &MriImage, _threshold: f32) -> Result<Vec<Detection>, InferenceError> {
                let _ = self.0.lock().unwrap().recv();
                Ok(Vec::new())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let (release, gate) = mpsc::channel();
        let mut svc = AnalysisService::new(
            Arc::new(DetectionModel::from_engine(GatedEngine(Mutex::new(gate)))),
            Arc::new(ImageRsCodec::new()),
        );
        svc.load_image(&write_png(dir.path(), "a.png")).unwrap();
        let stale = svc.start_analysis().unwrap();
        svc.load_image(&write_png(dir.path(), "b.png")).unwrap();

        assert_eq!(svc.start_analysis(), Err(SessionError::WorkerBusy));
        assert_eq!(svc.session().state(), SessionState::Loaded);
        assert_eq!(svc.pending_jobs(), 1);

        release.send(()).unwrap();
        assert_eq!(svc.wait_for_idle(), vec![AnalysisEvent::Discarded { generation: stale }]);

        let current = svc.start_analysis().unwrap();
        assert!(current > stale);
        release.send(()).unwrap();
        assert_eq!(svc.wait_for_idle().len(), 1);
        assert_eq!(svc.session().state(), SessionState::Complete);
    }

    #[test]
    fn test_threshold_is_clamped() {
        let svc = service(Vec::new()).with_confidence_threshold(1.7);
        assert!((svc.confidence_threshold() - 1.0).abs() < f32::EPSILON);
    }
}
