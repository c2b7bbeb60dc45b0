use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::detect::backend::DetectorBackend;
use crate::detect::classes::coco_class_names;
use crate::detect::result::RawDetection;
use crate::frame::Frame;

/// Replays recorded detector output, one entry per frame.
///
/// File format (JSON):
///
/// ```json
/// {
///   "class_names": ["person", "chair", "table"],
///   "repeat": false,
///   "frames": [
///     [{"class_id": 2, "bbox": [100, 100, 400, 400], "confidence": 0.9}],
///     []
///   ]
/// }
/// ```
///
/// `class_names` defaults to the COCO table. Past the last entry the backend
/// returns nothing, or starts over when `repeat` is set.
pub struct ReplayBackend {
    class_names: Vec<String>,
    frames: Vec<Vec<RawDetection>>,
    repeat: bool,
    cursor: usize,
}

#[derive(Debug, Deserialize)]
struct ReplayFile {
    class_names: Option<Vec<String>>,
    #[serde(default)]
    repeat: bool,
    frames: Vec<Vec<RawDetection>>,
}

impl ReplayBackend {
    pub fn new(class_names: Vec<String>, frames: Vec<Vec<RawDetection>>, repeat: bool) -> Self {
        Self {
            class_names,
            frames,
            repeat,
            cursor: 0,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read replay file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid replay file {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: ReplayFile = serde_json::from_str(json)?;
        let class_names = file.class_names.unwrap_or_else(coco_class_names);
        for (i, frame) in file.frames.iter().enumerate() {
            if let Some(bad) = frame.iter().find(|d| d.class_id >= class_names.len()) {
                return Err(anyhow!(
                    "frame {} references class_id {} but only {} class names are defined",
                    i,
                    bad.class_id,
                    class_names.len()
                ));
            }
        }
        Ok(Self::new(class_names, file.frames, file.repeat))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl DetectorBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<RawDetection>> {
        if self.frames.is_empty() {
            return Ok(Vec::new());
        }
        if self.cursor >= self.frames.len() {
            if !self.repeat {
                return Ok(Vec::new());
            }
            self.cursor = 0;
        }
        let out = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "class_names": ["table", "chair"],
        "frames": [
            [{"class_id": 0, "bbox": [100, 100, 400, 400], "confidence": 0.9}],
            [{"class_id": 1, "bbox": [0, 0, 50, 50], "confidence": 0.5}]
        ]
    }"#;

    fn frame() -> Frame {
        Frame::filled(8, 8, image::Rgb([0, 0, 0])).unwrap()
    }

    #[test]
    fn replays_frames_in_order_then_goes_quiet() {
        let mut backend = ReplayBackend::from_json(JSON).unwrap();
        assert_eq!(backend.len(), 2);
        assert_eq!(backend.detect(&frame()).unwrap()[0].class_id, 0);
        assert_eq!(backend.detect(&frame()).unwrap()[0].class_id, 1);
        assert!(backend.detect(&frame()).unwrap().is_empty());
    }

    #[test]
    fn repeat_wraps_around() {
        let json = JSON.replacen('{', r#"{"repeat": true,"#, 1);
        let mut backend = ReplayBackend::from_json(&json).unwrap();
        backend.detect(&frame()).unwrap();
        backend.detect(&frame()).unwrap();
        assert_eq!(backend.detect(&frame()).unwrap()[0].class_id, 0);
    }

    #[test]
    fn defaults_to_coco_names() {
        let backend = ReplayBackend::from_json(r#"{"frames": []}"#).unwrap();
        assert_eq!(backend.class_names().len(), 80);
    }

    #[test]
    fn rejects_unknown_class_ids() {
        let json = r#"{"class_names": ["table"], "frames": [[{"class_id": 3, "bbox": [0,0,1,1], "confidence": 1.0}]]}"#;
        let err = ReplayBackend::from_json(json).err().unwrap();
        assert!(err.to_string().contains("class_id 3"));
    }
}
