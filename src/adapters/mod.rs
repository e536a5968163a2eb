//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `onnx`: ONNX Runtime (`ort`) for lesion detection
//! - `imaging`: `image` / `imageproc` for decoding and box overlays
//! - `pdf`: one-page PDF report rendering (default)
//! - `html`: self-contained HTML report rendering
//! - `sanitize`: identifier filtering for logs

pub mod html;
pub mod imaging;
pub mod onnx;
pub mod pdf;
pub mod sanitize;
