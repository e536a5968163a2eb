//! Raw detections emitted by the lesion detection model.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in image pixel coordinates.
///
/// Always satisfies `x1 < x2` and `y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl BoundingBox {
    /// Build a box, rejecting empty or inverted extents.
    #[must_use]
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Option<Self> {
        (x1 < x2 && y1 < y2).then_some(Self { x1, y1, x2, y2 })
    }

    #[must_use]
    pub fn x1(&self) -> i32 {
        self.x1
    }

    #[must_use]
    pub fn y1(&self) -> i32 {
        self.y1
    }

    #[must_use]
    pub fn x2(&self) -> i32 {
        self.x2
    }

    #[must_use]
    pub fn y2(&self) -> i32 {
        self.y2
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.x2.abs_diff(self.x1)
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.y2.abs_diff(self.y1)
    }

    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Intersection over union with another box, in `[0, 1]`.
    #[must_use]
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        if ix1 >= ix2 || iy1 >= iy2 {
            return 0.0;
        }

        let inter = u64::from(ix2.abs_diff(ix1)) * u64::from(iy2.abs_diff(iy1));
        let union = self.area() + other.area() - inter;
        if union == 0 {
            0.0
        } else {
            inter as f32 / union as f32
        }
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}) - ({}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// One predicted lesion region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label reported by the model
    pub label: String,

    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,

    /// Region in source image pixels
    pub bbox: BoundingBox,
}

impl Detection {
    #[must_use]
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}
