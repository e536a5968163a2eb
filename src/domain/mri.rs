//! Decoded MRI slice.

use std::path::{Path, PathBuf};

use image::DynamicImage;

/// A decoded image together with where it came from.
#[derive(Clone)]
pub struct MriImage {
    path: PathBuf,
    pixels: DynamicImage,
    fingerprint: String,
}

impl MriImage {
    /// Wrap decoded pixels.
    ///
    /// `fingerprint` is the hex SHA-256 of the source file bytes.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, pixels: DynamicImage, fingerprint: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            pixels,
            fingerprint: fingerprint.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for display, falling back to the full path.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    #[must_use]
    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

// Pixel buffers are large; keep them out of debug output and logs.
impl std::fmt::Debug for MriImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MriImage")
            .field("path", &self.path)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}
