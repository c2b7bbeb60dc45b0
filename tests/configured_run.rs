use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use tempfile::{NamedTempFile, TempDir};

use table_watch::config::{AppConfig, DetectorKind, Overrides, RecordingFormat};
use table_watch::{CancellationToken, PipelineError, StopReason, StreamDriver};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "TABLEWATCH_CONFIG",
        "TABLEWATCH_SOURCE",
        "TABLEWATCH_DETECTOR",
        "TABLEWATCH_MODEL",
        "TABLEWATCH_REPLAY",
        "TABLEWATCH_RECORD",
        "TABLEWATCH_FONT",
        "TABLEWATCH_SEAT_CLASSES",
    ] {
        std::env::remove_var(key);
    }
}

fn write_replay() -> NamedTempFile {
    let frame = r#"[{"class_id": 0, "bbox": [2, 2, 28, 20], "confidence": 0.9},
                    {"class_id": 1, "bbox": [5, 5, 10, 10], "confidence": 0.8}]"#;
    let contents = format!(
        r#"{{"class_names": ["table", "chair"], "frames": [{f}, {f}, {f}]}}"#,
        f = frame
    );
    let mut file = NamedTempFile::new().expect("temp replay");
    file.write_all(contents.as_bytes()).expect("write replay");
    file
}

fn overrides(source: &str, record: &Path, format: RecordingFormat) -> Overrides {
    Overrides {
        source: Some(source.to_string()),
        record: Some(record.to_path_buf()),
        record_format: Some(format),
        no_display: true,
        ..Overrides::default()
    }
}

#[test]
fn configured_run_records_every_frame_as_png() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let replay = write_replay();
    let out = TempDir::new().unwrap();
    let record = out.path().join("frames");
    let mut overrides = overrides(
        "stub://bench?frames=3&width=32&height=24",
        &record,
        RecordingFormat::Frames,
    );
    overrides.detector = Some(DetectorKind::Replay);
    overrides.replay = Some(replay.path().to_path_buf());
    let cfg = AppConfig::load(None, &overrides).unwrap();

    let mut driver = StreamDriver::from_config(&cfg, CancellationToken::new()).unwrap();
    let summary = driver.run().unwrap();
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert_eq!(summary.last_report.unwrap().occupied_count(), 1);

    for i in 1..=3 {
        assert!(record.join(format!("frame_{:06}.png", i)).is_file(), "frame {}", i);
    }
    assert!(!record.join("frame_000004.png").exists());

    let first = image::open(record.join("frame_000001.png")).unwrap().to_rgb8();
    assert_eq!((first.width(), first.height()), (32, 24));
}

#[cfg(not(feature = "record-ffmpeg"))]
#[test]
fn video_recording_without_encoder_is_a_sink_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let out = TempDir::new().unwrap();
    let cfg = AppConfig::load(
        None,
        &overrides(
            "stub://bench?frames=1",
            &out.path().join("out.mp4"),
            RecordingFormat::Video,
        ),
    )
    .unwrap();

    let result = StreamDriver::from_config(&cfg, CancellationToken::new());
    assert!(matches!(result, Err(PipelineError::Sink { .. })));
    assert!(!out.path().join("out.mp4").exists());
}

#[test]
fn unopenable_source_is_unavailable() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let out = TempDir::new().unwrap();
    let record = out.path().join("frames");
    let cfg = AppConfig::load(
        None,
        &overrides("/nonexistent/cafe.mp4", &record, RecordingFormat::Frames),
    )
    .unwrap();

    // Without ffmpeg the path is rejected while assembling; with it, on open.
    let result = StreamDriver::from_config(&cfg, CancellationToken::new())
        .and_then(|mut driver| driver.run());
    assert!(matches!(
        result,
        Err(PipelineError::SourceUnavailable { .. })
    ));
    assert!(!record.join("frame_000001.png").exists());
}
