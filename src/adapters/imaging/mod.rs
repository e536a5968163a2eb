//! Image codec adapter backed by the `image` and `imageproc` crates.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgba};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use sha2::{Digest, Sha256};

use crate::domain::{BoundingBox, ExportError, ImageDecodeError, MriImage};
use crate::ports::ImageCodec;

/// Outline color for detection boxes (pure red).
pub const OUTLINE_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Outline thickness in pixels.
pub const OUTLINE_THICKNESS: u32 = 5;

/// Decodes common raster formats and draws detection overlays.
#[derive(Debug, Clone)]
pub struct ImageRsCodec {
    color: Rgba<u8>,
    thickness: u32,
}

impl ImageRsCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            color: OUTLINE_COLOR,
            thickness: OUTLINE_THICKNESS,
        }
    }

    /// Override outline styling.
    #[must_use]
    pub fn with_outline(mut self, color: Rgba<u8>, thickness: u32) -> Self {
        self.color = color;
        self.thickness = thickness.max(1);
        self
    }
}

impl Default for ImageRsCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

impl ImageCodec for ImageRsCodec {
    fn load(&self, path: &Path) -> Result<MriImage, ImageDecodeError> {
        let bytes = std::fs::read(path).map_err(|source| ImageDecodeError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let pixels = image::load_from_memory(&bytes).map_err(|e| ImageDecodeError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            "Decoded {:?}: {}x{} ({} bytes)",
            path,
            pixels.width(),
            pixels.height(),
            bytes.len()
        );

        Ok(MriImage::new(path, pixels, sha256_hex(&bytes)))
    }

    fn annotate(&self, image: &MriImage, boxes: &[BoundingBox]) -> DynamicImage {
        if boxes.is_empty() {
            return image.pixels().clone();
        }

        let mut canvas = image.pixels().to_rgba8();
        for bbox in boxes {
            // Grow the outline outwards one ring at a time; imageproc clips to the canvas.
            for t in 0..self.thickness {
                let grow = t as i32;
                let rect = Rect::at(bbox.x1() - grow, bbox.y1() - grow)
                    .of_size(bbox.width() + 2 * t, bbox.height() + 2 * t);
                draw_hollow_rect_mut(&mut canvas, rect, self.color);
            }
        }
        DynamicImage::ImageRgba8(canvas)
    }

    fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>, ExportError> {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| ExportError::Encoding(e.to_string()))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};

    fn gray_scan(w: u32, h: u32) -> MriImage {
        let pixels = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb([40, 40, 40])));
        MriImage::new("scan.png", pixels, "ab")
    }

    #[test]
    fn test_load_png_and_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.png");
        RgbImage::from_pixel(16, 12, image::Rgb([10, 20, 30])).save(&path).unwrap();

        let codec = ImageRsCodec::new();
        let scan = codec.load(&path).expect("png should decode");

        assert_eq!((scan.width(), scan.height()), (16, 12));
        assert_eq!(scan.fingerprint().len(), 64);
        assert_eq!(scan.fingerprint(), sha256_hex(&std::fs::read(&path).unwrap()));
    }

    #[test]
    fn test_load_missing_file() {
        let codec = ImageRsCodec::new();
        let err = codec.load(Path::new("/nonexistent/slice.png")).unwrap_err();
        assert!(matches!(err, ImageDecodeError::Unreadable { .. }));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = ImageRsCodec::new().load(&path).unwrap_err();
        assert!(matches!(err, ImageDecodeError::Decode { .. }));
    }

    #[test]
    fn test_annotate_draws_outline_only() {
        let scan = gray_scan(64, 64);
        let bbox = BoundingBox::new(20, 20, 40, 40).unwrap();
        let annotated = ImageRsCodec::new().with_outline(OUTLINE_COLOR, 1).annotate(&scan, &[bbox]);

        assert_eq!(annotated.get_pixel(20, 20), OUTLINE_COLOR);
        assert_eq!(annotated.get_pixel(30, 20), OUTLINE_COLOR);
        assert_eq!(annotated.get_pixel(30, 30), Rgba([40, 40, 40, 255]));
        assert_eq!(annotated.get_pixel(5, 5), Rgba([40, 40, 40, 255]));
    }

    #[test]
    fn test_annotate_thick_outline_clips_at_edges() {
        let scan = gray_scan(32, 32);
        let bbox = BoundingBox::new(0, 0, 10, 10).unwrap();
        let annotated = ImageRsCodec::new().annotate(&scan, &[bbox]);

        assert_eq!(annotated.dimensions(), (32, 32));
        assert_eq!(annotated.get_pixel(0, 5), OUTLINE_COLOR);
    }

    #[test]
    fn test_annotate_without_boxes_is_unchanged() {
        let scan = gray_scan(8, 8);
        let annotated = ImageRsCodec::new().annotate(&scan, &[]);
        assert_eq!(annotated.as_bytes(), scan.pixels().as_bytes());
    }

    #[test]
    fn test_encode_png_signature() {
        let png = ImageRsCodec::new().encode_png(gray_scan(4, 4).pixels()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
