//! ONNX Runtime adapter for YOLO-style lesion detection models.
//!
//! A model is split across two artifacts:
//! - a model-definition directory holding `model.json` (labels, input size,
//!   post-processing parameters)
//! - an ONNX weights file
//!
//! Both must exist before the runtime is touched.

use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use ndarray::{ArrayViewD, Axis, IxDyn};
use ort::session::Session;
use ort::value::Tensor;
use serde::{Deserialize, Serialize};

use crate::domain::{BoundingBox, Detection, InferenceError, ModelLoadError, MriImage};
use crate::ports::DetectionEngine;

/// File name of the model definition inside the model directory.
pub const MODEL_DEFINITION_FILE: &str = "model.json";

fn default_input_size() -> u32 {
    640
}

fn default_iou_threshold() -> f32 {
    0.45
}

fn default_max_detections() -> usize {
    100
}

/// Contents of `model.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Logical model name, e.g. "yolov7-brain-mets"
    pub name: String,

    /// Square network input size in pixels
    #[serde(default = "default_input_size")]
    pub input_size: u32,

    /// Class names, indexed by class id
    pub labels: Vec<String>,

    /// IoU above which overlapping boxes of one class are suppressed
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,

    /// Upper bound on returned detections
    #[serde(default = "default_max_detections")]
    pub max_detections: usize,
}

impl ModelDefinition {
    /// Read and validate `model.json` from a model directory.
    ///
    /// # Errors
    /// Returns `MissingArtifact` if the file is absent and
    /// `InvalidDefinition` if it cannot be parsed or is inconsistent.
    pub fn load(model_dir: &Path) -> Result<Self, ModelLoadError> {
        let path = model_dir.join(MODEL_DEFINITION_FILE);
        if !path.is_file() {
            return Err(ModelLoadError::MissingArtifact(path));
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| ModelLoadError::InvalidDefinition(format!("{path:?}: {e}")))?;
        let definition: ModelDefinition = serde_json::from_str(&content)
            .map_err(|e| ModelLoadError::InvalidDefinition(format!("{path:?}: {e}")))?;

        definition.validate()?;
        Ok(definition)
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.labels.is_empty() {
            return Err(ModelLoadError::InvalidDefinition("labels must not be empty".into()));
        }
        if self.input_size == 0 || self.input_size > 4096 {
            return Err(ModelLoadError::InvalidDefinition(format!(
                "input_size out of range: {}",
                self.input_size
            )));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(ModelLoadError::InvalidDefinition(format!(
                "iou_threshold out of range: {}",
                self.iou_threshold
            )));
        }
        Ok(())
    }
}

/// YOLO detector running on ONNX Runtime.
pub struct OnnxLesionEngine {
    definition: ModelDefinition,
    // `Session::run` needs exclusive access.
    session: Mutex<Session>,
}

impl OnnxLesionEngine {
    /// Load the model definition and weights.
    ///
    /// # Errors
    /// Returns `ModelLoadError` if either artifact is missing or the runtime
    /// rejects the weights.
    pub fn load(model_dir: &Path, weights: &Path, intra_threads: usize) -> Result<Self, ModelLoadError> {
        if !model_dir.is_dir() {
            return Err(ModelLoadError::MissingArtifact(model_dir.to_path_buf()));
        }
        if !weights.is_file() {
            return Err(ModelLoadError::MissingArtifact(weights.to_path_buf()));
        }

        let definition = ModelDefinition::load(model_dir)?;

        tracing::info!("Loading ONNX weights from {:?}", weights);
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(intra_threads.max(1)))
            .and_then(|b| b.commit_from_file(weights))
            .map_err(|e| ModelLoadError::Runtime(e.to_string()))?;

        tracing::info!(
            "Loaded model {} (input_size={}, classes={}, iou_threshold={})",
            definition.name,
            definition.input_size,
            definition.labels.len(),
            definition.iou_threshold
        );

        Ok(Self {
            definition,
            session: Mutex::new(session),
        })
    }

    #[must_use]
    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    /// NCHW float tensor data in `[0, 1]` for a square network input.
    fn preprocess(image: &MriImage, size: u32) -> Vec<f32> {
        let rgb = image.pixels().to_rgb8();
        let resized = image::imageops::resize(&rgb, size, size, FilterType::Triangle);

        let plane = (size as usize) * (size as usize);
        let mut data = vec![0.0f32; 3 * plane];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let idx = (y as usize) * (size as usize) + x as usize;
            data[idx] = f32::from(pixel[0]) / 255.0;
            data[plane + idx] = f32::from(pixel[1]) / 255.0;
            data[2 * plane + idx] = f32::from(pixel[2]) / 255.0;
        }
        data
    }
}

impl DetectionEngine for OnnxLesionEngine {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn infer(&self, image: &MriImage, confidence_threshold: f32) -> Result<Vec<Detection>, InferenceError> {
        let size = self.definition.input_size;
        let input = Self::preprocess(image, size);
        let shape = vec![1i64, 3, i64::from(size), i64::from(size)];
        let tensor = Tensor::from_array((shape, input)).map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Runtime("Inference session lock poisoned".into()))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;
        let (out_shape, out_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::MalformedOutput(e.to_string()))?;

        let dims: Vec<usize> = out_shape.iter().map(|&d| d.max(0) as usize).collect();
        let frame = FrameGeometry {
            input_size: size,
            width: image.width(),
            height: image.height(),
        };

        let candidates = decode_predictions(&dims, out_data, &self.definition.labels, frame, confidence_threshold)?;
        let mut detections = non_max_suppression(candidates, self.definition.iou_threshold);
        detections.truncate(self.definition.max_detections);

        tracing::debug!(
            "{} produced {} detection(s) at threshold {:.2}",
            self.definition.name,
            detections.len(),
            confidence_threshold
        );
        Ok(detections)
    }
}

/// Mapping between network input space and source image pixels.
#[derive(Debug, Clone, Copy)]
pub struct FrameGeometry {
    pub input_size: u32,
    pub width: u32,
    pub height: u32,
}

/// Decode a YOLO output tensor of shape `(1, 4 + classes, candidates)`.
///
/// Each candidate holds centre-x, centre-y, width, height in network input
/// pixels, followed by one score per class. Candidates whose best score is
/// below `threshold`, and boxes that collapse after clamping, are dropped.
///
/// # Errors
/// Returns `MalformedOutput` if the tensor shape does not match the labels.
pub fn decode_predictions(
    dims: &[usize],
    data: &[f32],
    labels: &[String],
    frame: FrameGeometry,
    threshold: f32,
) -> Result<Vec<Detection>, InferenceError> {
    let view = ArrayViewD::from_shape(IxDyn(dims), data)
        .map_err(|e| InferenceError::MalformedOutput(format!("shape {dims:?}: {e}")))?;

    if view.ndim() != 3 || view.shape()[0] != 1 {
        return Err(InferenceError::MalformedOutput(format!(
            "expected (1, 4 + classes, candidates), got {dims:?}"
        )));
    }
    let rows = view.shape()[1];
    if rows < 5 || rows - 4 != labels.len() {
        return Err(InferenceError::MalformedOutput(format!(
            "output has {} class rows, model defines {} labels",
            rows.saturating_sub(4),
            labels.len()
        )));
    }

    let view = view.index_axis(Axis(0), 0);
    let candidates = view.shape()[1];
    let sx = frame.width as f32 / frame.input_size as f32;
    let sy = frame.height as f32 / frame.input_size as f32;
    let max_x = frame.width as f32;
    let max_y = frame.height as f32;

    let mut detections = Vec::new();
    for i in 0..candidates {
        let mut class_id = 0;
        let mut score = f32::MIN;
        for c in 0..labels.len() {
            let s = view[[4 + c, i]];
            if s > score {
                score = s;
                class_id = c;
            }
        }
        if score.is_nan() || score < threshold {
            continue;
        }

        let cx = view[[0, i]];
        let cy = view[[1, i]];
        let w = view[[2, i]];
        let h = view[[3, i]];

        let x1 = ((cx - w / 2.0) * sx).clamp(0.0, max_x).round() as i32;
        let y1 = ((cy - h / 2.0) * sy).clamp(0.0, max_y).round() as i32;
        let x2 = ((cx + w / 2.0) * sx).clamp(0.0, max_x).round() as i32;
        let y2 = ((cy + h / 2.0) * sy).clamp(0.0, max_y).round() as i32;

        if let Some(bbox) = BoundingBox::new(x1, y1, x2, y2) {
            detections.push(Detection::new(labels[class_id].clone(), score, bbox));
        }
    }

    Ok(detections)
}

/// Per-class greedy non-maximum suppression.
///
/// Output is sorted by descending confidence.
#[must_use]
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = keep
            .iter()
            .any(|k| k.label == det.label && k.bbox.iou(&det.bbox) > iou_threshold);
        if !suppressed {
            keep.push(det);
        }
    }
    keep
}
