//! Ports layer: Trait definitions for external capabilities.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (inference runtime,
//! image codecs, document rendering).

mod detector;
mod document;
mod imaging;

pub use detector::DetectionEngine;
pub use document::DocumentRenderer;
pub use imaging::ImageCodec;
