//! Imaging port: decoding, annotation and encoding of raster images.

use std::path::Path;

use image::DynamicImage;

use crate::domain::{BoundingBox, ExportError, ImageDecodeError, MriImage};

/// Image decode/draw/encode capability.
pub trait ImageCodec: Send + Sync {
    /// Decode the image at `path`.
    ///
    /// # Errors
    /// Returns `ImageDecodeError` if the file is missing, unreadable,
    /// corrupt, or in an unsupported format.
    fn load(&self, path: &Path) -> Result<MriImage, ImageDecodeError>;

    /// Copy of the image with every box drawn as an unfilled outline.
    fn annotate(&self, image: &MriImage, boxes: &[BoundingBox]) -> DynamicImage;

    /// Encode an image as PNG.
    ///
    /// # Errors
    /// Returns `ExportError::Encoding` if encoding fails.
    fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>, ExportError>;
}
