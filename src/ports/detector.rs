//! Detection engine port: Trait for the opaque lesion detection model.
//!
//! This trait abstracts the inference runtime (ONNX Runtime) from the
//! application logic.

use crate::domain::{Detection, InferenceError, MriImage};

/// Raw, fallible inference over one decoded image.
///
/// Implementations may fail; the `DetectionModel` that owns an engine is
/// responsible for logging failures and degrading them to an empty list.
pub trait DetectionEngine: Send + Sync {
    /// Name of the loaded model (for logging and display).
    fn name(&self) -> &str;

    /// Detect lesions in `image`.
    ///
    /// Returns only detections whose confidence is at least
    /// `confidence_threshold`.
    ///
    /// # Errors
    /// Returns `InferenceError` if the runtime fails or produces output
    /// that cannot be interpreted.
    fn infer(&self, image: &MriImage, confidence_threshold: f32) -> Result<Vec<Detection>, InferenceError>;
}
