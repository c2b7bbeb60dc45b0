use std::io::Write;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use table_watch::config::{AppConfig, DetectorKind, Overrides, RecordingFormat};
use table_watch::ObjectClass;

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

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"
        [source]
        path = "videos/cafe.mp4"
        fps = 15.0

        [detector]
        backend = "tract"
        model = "models/yolov8n.onnx"
        iou = 0.5

        [display]
        enabled = false
        title = "Cafe"

        [recording]
        path = "out.mp4"
        "#,
    );

    std::env::set_var("TABLEWATCH_CONFIG", file.path());
    std::env::set_var("TABLEWATCH_SOURCE", "stub://cafe");
    std::env::set_var("TABLEWATCH_SEAT_CLASSES", "chair, person");

    let cfg = AppConfig::load(None, &Overrides::default()).expect("load config");

    assert_eq!(cfg.source.path, "stub://cafe");
    assert_eq!(cfg.source.fps, 15.0);
    assert_eq!(cfg.detector.kind, DetectorKind::Tract);
    assert_eq!(
        cfg.detector.model_path.as_deref(),
        Some(std::path::Path::new("models/yolov8n.onnx"))
    );
    assert_eq!(cfg.detector.iou, 0.5);
    assert_eq!(
        cfg.occupancy.seat_classes,
        vec![ObjectClass::Chair, ObjectClass::Person]
    );
    assert!(!cfg.display.enabled);
    assert_eq!(cfg.display.title, "Cafe");
    assert_eq!(cfg.recording.format, RecordingFormat::Video);

    clear_env();
}

#[test]
fn command_line_overrides_beat_environment() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("TABLEWATCH_SOURCE", "stub://from-env");
    std::env::set_var("TABLEWATCH_DETECTOR", "replay");

    let overrides = Overrides {
        source: Some("stub://from-cli".into()),
        detector: Some(DetectorKind::None),
        record: Some("frames_out".into()),
        record_format: Some(RecordingFormat::Frames),
        ..Overrides::default()
    };
    let cfg = AppConfig::load(None, &overrides).expect("load config");

    assert_eq!(cfg.source.path, "stub://from-cli");
    assert_eq!(cfg.detector.kind, DetectorKind::None);
    assert_eq!(cfg.recording.format, RecordingFormat::Frames);
    assert_eq!(cfg.occupancy.seat_classes, vec![ObjectClass::Chair]);

    clear_env();
}

#[test]
fn explicit_path_is_used_over_env_path() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let env_file = write_config("[source]\npath = \"stub://env-file\"\n");
    let cli_file = write_config("[source]\npath = \"stub://cli-file\"\n");
    std::env::set_var("TABLEWATCH_CONFIG", env_file.path());

    let cfg = AppConfig::load(Some(cli_file.path()), &Overrides::default()).expect("load");
    assert_eq!(cfg.source.path, "stub://cli-file");

    clear_env();
}

#[test]
fn rejects_missing_source_and_bad_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    assert!(AppConfig::load(None, &Overrides::default()).is_err());

    std::env::set_var("TABLEWATCH_SOURCE", "stub://cam");
    std::env::set_var("TABLEWATCH_SEAT_CLASSES", "table");
    assert!(AppConfig::load(None, &Overrides::default()).is_err());
    std::env::remove_var("TABLEWATCH_SEAT_CLASSES");

    std::env::set_var("TABLEWATCH_DETECTOR", "yolo");
    assert!(AppConfig::load(None, &Overrides::default()).is_err());
    std::env::remove_var("TABLEWATCH_DETECTOR");

    let file = write_config("[detector]\nconfidence = 2.0\n");
    assert!(AppConfig::load(Some(file.path()), &Overrides::default()).is_err());

    let malformed = write_config("[source\npath = 1");
    assert!(AppConfig::load(Some(malformed.path()), &Overrides::default()).is_err());

    clear_env();
}
