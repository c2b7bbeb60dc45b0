use crate::config::{DetectorKind, DetectorSettings};
use crate::detect::backend::DetectorBackend;
use crate::detect::backends::build_backend;
use crate::detect::result::{BBox, Detection, RawDetection};
use crate::error::PipelineError;
use crate::frame::Frame;

/// Normalizes detector output into labelled integer-pixel detections.
///
/// The backend is optional. Without one, `run` returns no detections and the
/// pipeline passes frames through with only the person-count caption.
pub struct DetectionAdapter {
    backend: Option<Box<dyn DetectorBackend>>,
}

impl DetectionAdapter {
    pub fn new(backend: Option<Box<dyn DetectorBackend>>) -> Self {
        Self { backend }
    }

    /// Adapter with detection disabled.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Build the configured backend, falling back to pass-through when it is unavailable.
    pub fn from_settings(settings: &DetectorSettings) -> Self {
        match build_backend(settings) {
            Ok(backend) => {
                log::info!("detector backend: {}", backend.name());
                Self::new(Some(backend))
            }
            Err(e) if settings.kind == DetectorKind::None => {
                log::info!("{}; frames pass through", e);
                Self::disabled()
            }
            Err(e) => {
                log::warn!("{}; continuing without detections", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    /// Warm up the backend, if any.
    ///
    /// A backend that fails to warm up is dropped and reported as
    /// `DetectorUnavailable`; the adapter then passes frames through.
    pub fn warm_up(&mut self) -> Result<(), PipelineError> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(());
        };
        if let Err(e) = backend.warm_up() {
            let reason = format!("{} warm-up failed: {:#}", backend.name(), e);
            self.backend = None;
            return Err(PipelineError::DetectorUnavailable { reason });
        }
        Ok(())
    }

    /// Detect objects in `frame`.
    ///
    /// A backend failure is returned as `DetectorInference` for this frame rather
    /// than an empty list, so failures never look like "nothing detected".
    pub fn run(
        &mut self,
        frame: &Frame,
        frame_index: u64,
    ) -> Result<Vec<Detection>, PipelineError> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(Vec::new());
        };

        let raw = backend
            .detect(frame)
            .map_err(|source| PipelineError::DetectorInference {
                frame_index,
                source,
            })?;

        let names = backend.class_names();
        let detections: Vec<Detection> = raw
            .iter()
            .filter_map(|r| normalize(r, names, frame.width(), frame.height()))
            .collect();

        log::debug!(
            "frame {}: {} detections from {}",
            frame_index,
            detections.len(),
            backend.name()
        );
        for d in &detections {
            log::debug!("detected: {} {:?} conf={:.2}", d.label(), d.bbox(), d.confidence());
        }
        Ok(detections)
    }
}

/// Clip a raw box to the frame, round to integer pixels and resolve its label.
fn normalize(raw: &RawDetection, names: &[String], width: u32, height: u32) -> Option<Detection> {
    if raw.bbox.iter().any(|v| !v.is_finite()) {
        log::debug!("dropping detection with non-finite box: {:?}", raw.bbox);
        return None;
    }

    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;
    let clip = |v: f32, max: f32| v.clamp(0.0, max).round() as i32;
    let [x1, y1, x2, y2] = raw.bbox;
    let bbox = BBox::new(
        clip(x1.min(x2), max_x),
        clip(y1.min(y2), max_y),
        clip(x1.max(x2), max_x),
        clip(y1.max(y2), max_y),
    );

    let label = names
        .get(raw.class_id)
        .cloned()
        .unwrap_or_else(|| format!("class_{}", raw.class_id));

    Some(Detection::new(label, bbox, raw.confidence))
}
