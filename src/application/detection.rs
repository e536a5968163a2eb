//! Detection model: owns the inference engine, or records why there is none.
//!
//! A missing or broken model is a permanent, observable condition
//! (`Unavailable`) rather than an engine that quietly returns nothing.

use std::path::Path;
use std::time::Instant;

use crate::adapters::onnx::OnnxLesionEngine;
use crate::domain::{Detection, InferenceError, MriImage};
use crate::ports::DetectionEngine;

/// Loaded detection capability.
pub enum DetectionModel {
    /// Engine initialized and ready for inference
    Ready(Box<dyn DetectionEngine>),
    /// Initialization failed; every detection returns nothing
    Unavailable { reason: String },
}

impl DetectionModel {
    /// Load the ONNX model, degrading to `Unavailable` on any failure.
    #[must_use]
    pub fn load_onnx(model_dir: &Path, weights: &Path, intra_threads: usize) -> Self {
        match OnnxLesionEngine::load(model_dir, weights, intra_threads) {
            Ok(engine) => Self::from_engine(engine),
            Err(e) => {
                tracing::warn!("Detection model unavailable: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    #[must_use]
    pub fn from_engine(engine: impl DetectionEngine + 'static) -> Self {
        Self::Ready(Box::new(engine))
    }

    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Engine name, or `None` if unavailable.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Ready(engine) => Some(engine.name()),
            Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }

    /// Run detection, reporting failures to the caller.
    ///
    /// Detections below `confidence_threshold` are dropped even if the engine
    /// returned them.
    ///
    /// # Errors
    /// `ModelUnavailable` if the model never loaded, or whatever the engine
    /// reported.
    pub fn try_detect(&self, image: &MriImage, confidence_threshold: f32) -> Result<Vec<Detection>, InferenceError> {
        match self {
            Self::Unavailable { reason } => Err(InferenceError::ModelUnavailable(reason.clone())),
            Self::Ready(engine) => {
                let mut detections = engine.infer(image, confidence_threshold)?;
                detections.retain(|d| d.confidence >= confidence_threshold);
                Ok(detections)
            }
        }
    }

    /// Run detection; failures are logged and yield an empty list.
    #[must_use]
    pub fn detect(&self, image: &MriImage, confidence_threshold: f32) -> Vec<Detection> {
        self.detect_or_degrade(image, confidence_threshold).0
    }

    /// Same as [`Self::detect`], also handing back the failure that emptied
    /// the result.
    #[must_use]
    pub fn detect_or_degrade(
        &self,
        image: &MriImage,
        confidence_threshold: f32,
    ) -> (Vec<Detection>, Option<InferenceError>) {
        let started = Instant::now();
        let outcome = self.try_detect(image, confidence_threshold);
        let elapsed_ms = started.elapsed().as_millis();

        match outcome {
            Ok(detections) => {
                tracing::info!(
                    "Detection finished in {} ms: {} lesion(s)",
                    elapsed_ms,
                    detections.len()
                );
                (detections, None)
            }
            Err(e @ InferenceError::ModelUnavailable(_)) => {
                tracing::warn!("Detection skipped: {}", e);
                (Vec::new(), Some(e))
            }
            Err(e) => {
                tracing::error!("Detection failed after {} ms: {}", elapsed_ms, e);
                (Vec::new(), Some(e))
            }
        }
    }
}

impl std::fmt::Debug for DetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(engine) => f.debug_tuple("Ready").field(&engine.name()).finish(),
            Self::Unavailable { reason } => f.debug_struct("Unavailable").field("reason", reason).finish(),
        }
    }
}
