use serde::{Deserialize, Serialize};

/// Detector output before normalization: frame pixel coordinates as floats and a
/// class index into the backend's name table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_id: usize,
    /// `[x1, y1, x2, y2]` in frame pixels.
    pub bbox: [f32; 4],
    pub confidence: f32,
}

/// Axis-aligned box in integer pixel coordinates, `(x1, y1)` top-left and
/// `(x2, y2)` bottom-right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// True when every edge of `self` lies strictly inside `outer`.
    /// Shared edges do not count.
    pub fn is_strictly_inside(&self, outer: &BBox) -> bool {
        self.x1 > outer.x1 && self.y1 > outer.y1 && self.x2 < outer.x2 && self.y2 < outer.y2
    }
}

/// One object found in a frame. Immutable once built; fields are read through accessors.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    label: String,
    bbox: BBox,
    confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: BBox, confidence: f32) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}
