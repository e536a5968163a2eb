//! Background detection runner.
//!
//! Runs one `DetectionModel::detect_or_degrade` call on a worker thread so the interactive loop
//! never blocks on inference. The result travels back over a channel and is
//! picked up by the owner of the session when it polls, so all state changes
//! happen on the interactive thread.
//!
//! Every job produces exactly one `DetectionCompletion`: a panic inside the
//! engine, or a worker that dies without reporting, is turned into an
//! empty-result completion carrying the error.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::domain::{Detection, InferenceError, MriImage};

use super::detection::DetectionModel;

/// Result of one detection job.
#[derive(Debug, Clone)]
pub struct DetectionCompletion {
    /// Session generation the job was started for
    pub generation: u64,

    /// Detections (empty on failure)
    pub detections: Vec<Detection>,

    /// Failure description, if the job did not run cleanly
    pub error: Option<String>,
}

impl DetectionCompletion {
    fn failed(generation: u64, error: impl Into<String>) -> Self {
        Self {
            generation,
            detections: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Handle to an in-flight detection job.
pub struct DetectionJob {
    generation: u64,
    rx: Receiver<DetectionCompletion>,
    delivered: bool,
    _handle: Option<JoinHandle<()>>,
}

impl DetectionJob {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the completion has already been handed out.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Take the completion if it is ready (non-blocking).
    ///
    /// Returns `Some` at most once per job.
    pub fn try_complete(&mut self) -> Option<DetectionCompletion> {
        if self.delivered {
            return None;
        }

        let completion = match self.rx.try_recv() {
            Ok(completion) => completion,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                DetectionCompletion::failed(self.generation, "Detection worker exited without reporting")
            }
        };

        self.delivered = true;
        Some(completion)
    }

    /// Poll and, if the job finished, hand the completion to `on_complete`.
    ///
    /// Returns whether the callback fired.
    pub fn poll<F>(&mut self, on_complete: F) -> bool
    where
        F: FnOnce(DetectionCompletion),
    {
        match self.try_complete() {
            Some(completion) => {
                on_complete(completion);
                true
            }
            None => false,
        }
    }

    /// Block until the job finishes.
    ///
    /// Returns `None` only if the completion was already taken.
    pub fn wait(&mut self) -> Option<DetectionCompletion> {
        if self.delivered {
            return None;
        }

        let completion = self.rx.recv().unwrap_or_else(|_| {
            DetectionCompletion::failed(self.generation, "Detection worker exited without reporting")
        });
        self.delivered = true;
        Some(completion)
    }
}

/// Spawns detection jobs against a shared model.
#[derive(Clone)]
pub struct DetectionRunner {
    model: Arc<DetectionModel>,
}

impl DetectionRunner {
    #[must_use]
    pub fn new(model: Arc<DetectionModel>) -> Self {
        Self { model }
    }

    #[must_use]
    pub fn model(&self) -> &Arc<DetectionModel> {
        &self.model
    }

    /// Start detection for `image` on a worker thread.
    ///
    /// Callers must not submit a second job for a session while one is in
    /// flight; the session state machine enforces that.
    pub fn submit(&self, image: Arc<MriImage>, confidence_threshold: f32, generation: u64) -> DetectionJob {
        let (tx, rx) = mpsc::channel();
        let model = Arc::clone(&self.model);

        let spawned = thread::Builder::new()
            .name(format!("detection-{generation}"))
            .spawn({
                let tx = tx.clone();
                move || {
                    let completion = run_detection(&model, &image, confidence_threshold, generation);
                    let _ = tx.send(completion);
                }
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!("Failed to spawn detection worker: {}", e);
                let _ = tx.send(DetectionCompletion::failed(
                    generation,
                    format!("Failed to spawn detection worker: {e}"),
                ));
                None
            }
        };

        DetectionJob {
            generation,
            rx,
            delivered: false,
            _handle: handle,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_detection(model: &DetectionModel, image: &MriImage, threshold: f32, generation: u64) -> DetectionCompletion {
    tracing::debug!("Detection job for generation {} started", generation);

    match panic::catch_unwind(AssertUnwindSafe(|| model.detect_or_degrade(image, threshold))) {
        Ok((detections, error)) => DetectionCompletion {
            generation,
            detections,
            error: error.map(|e| e.to_string()),
        },
        Err(payload) => {
            let err = InferenceError::WorkerPanicked(panic_message(payload.as_ref()));
            tracing::error!("{}", err);
            DetectionCompletion::failed(generation, err.to_string())
        }
    }
}
