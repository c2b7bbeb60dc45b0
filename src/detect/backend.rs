use anyhow::Result;

use crate::detect::result::RawDetection;
use crate::frame::Frame;

/// Detector backend trait.
///
/// A backend wraps one object detector. It receives each frame read-only and
/// returns raw boxes in frame pixel coordinates; the `DetectionAdapter` turns
/// those into labelled `Detection`s using `class_names`.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Class-index-to-name table for this detector's output.
    fn class_names(&self) -> &[String];

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>>;

    /// Optional warm-up hook, called once before the first frame.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
