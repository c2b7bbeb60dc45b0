pub mod replay;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use replay::ReplayBackend;

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;

use crate::config::{DetectorKind, DetectorSettings};
use crate::detect::backend::DetectorBackend;
use crate::error::PipelineError;

/// Build the backend selected by `settings`.
///
/// Returns `DetectorUnavailable` when detection is disabled or the backend cannot
/// be constructed; callers degrade to pass-through rather than abort.
pub fn build_backend(
    settings: &DetectorSettings,
) -> Result<Box<dyn DetectorBackend>, PipelineError> {
    match settings.kind {
        DetectorKind::None => Err(PipelineError::DetectorUnavailable {
            reason: "detection disabled by configuration".to_string(),
        }),
        DetectorKind::Replay => {
            let path = settings
                .replay_path
                .as_ref()
                .ok_or_else(|| PipelineError::DetectorUnavailable {
                    reason: "replay backend selected without a replay file".to_string(),
                })?;
            let backend = ReplayBackend::from_path(path).map_err(|e| {
                PipelineError::DetectorUnavailable {
                    reason: format!("{:#}", e),
                }
            })?;
            Ok(Box::new(backend))
        }
        DetectorKind::Tract => build_tract(settings),
    }
}

#[cfg(feature = "backend-tract")]
fn build_tract(settings: &DetectorSettings) -> Result<Box<dyn DetectorBackend>, PipelineError> {
    let path = settings
        .model_path
        .as_ref()
        .ok_or_else(|| PipelineError::DetectorUnavailable {
            reason: "tract backend selected without a model path".to_string(),
        })?;
    let backend = TractBackend::new(path, settings.input_size)
        .map(|b| b.with_thresholds(settings.confidence, settings.iou))
        .map_err(|e| PipelineError::DetectorUnavailable {
            reason: format!("{:#}", e),
        })?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn build_tract(_settings: &DetectorSettings) -> Result<Box<dyn DetectorBackend>, PipelineError> {
    Err(PipelineError::DetectorUnavailable {
        reason: "tract backend requires the backend-tract feature".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_detector_is_unavailable() {
        let settings = DetectorSettings {
            kind: DetectorKind::None,
            ..DetectorSettings::default()
        };
        let err = build_backend(&settings).err().unwrap();
        assert!(matches!(err, PipelineError::DetectorUnavailable { .. }));
    }

    #[test]
    fn replay_without_file_is_unavailable() {
        let settings = DetectorSettings {
            kind: DetectorKind::Replay,
            replay_path: None,
            ..DetectorSettings::default()
        };
        assert!(matches!(
            build_backend(&settings),
            Err(PipelineError::DetectorUnavailable { .. })
        ));
    }

    #[test]
    fn replay_with_missing_file_is_unavailable() {
        let settings = DetectorSettings {
            kind: DetectorKind::Replay,
            replay_path: Some("/nonexistent/replay.json".into()),
            ..DetectorSettings::default()
        };
        assert!(matches!(
            build_backend(&settings),
            Err(PipelineError::DetectorUnavailable { .. })
        ));
    }
}
