use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::engine::{ObjectClass, RenderStyle, MAX_STROKE_WIDTH};
use crate::frame::DEFAULT_FPS;

const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_IOU: f32 = 0.45;
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_WINDOW_TITLE: &str = "Table Occupancy Detection";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AppConfigFile {
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    occupancy: Option<OccupancyConfigFile>,
    render: Option<RenderConfigFile>,
    display: Option<DisplayConfigFile>,
    recording: Option<RecordingConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SourceConfigFile {
    path: Option<String>,
    fps: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    backend: Option<DetectorKind>,
    model: Option<PathBuf>,
    replay: Option<PathBuf>,
    confidence: Option<f32>,
    iou: Option<f32>,
    input_size: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct OccupancyConfigFile {
    seat_classes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RenderConfigFile {
    font: Option<PathBuf>,
    stroke_width: Option<u32>,
    label_scale: Option<f32>,
    caption_scale: Option<f32>,
    count_scale: Option<f32>,
    margin_x: Option<i32>,
    margin_y: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DisplayConfigFile {
    enabled: Option<bool>,
    title: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RecordingConfigFile {
    path: Option<PathBuf>,
    format: Option<RecordingFormat>,
}

/// Which detector backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// No detector: frames pass through with only the person count drawn.
    #[default]
    None,
    /// Replay pre-recorded detections from a JSON file.
    Replay,
    /// Run a YOLO ONNX model with tract.
    Tract,
}

impl FromStr for DetectorKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "replay" => Ok(Self::Replay),
            "tract" => Ok(Self::Tract),
            other => Err(anyhow!(
                "unknown detector backend '{}' (expected none, replay or tract)",
                other
            )),
        }
    }
}

/// Output format for recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordingFormat {
    /// MPEG-4 video file.
    #[default]
    Video,
    /// Directory of numbered PNG files.
    Frames,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceSettings,
    pub detector: DetectorSettings,
    pub occupancy: OccupancySettings,
    pub render: RenderSettings,
    pub display: DisplaySettings,
    pub recording: RecordingSettings,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub path: String,
    /// Frame rate used when the source cannot report one.
    pub fps: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    pub kind: DetectorKind,
    pub model_path: Option<PathBuf>,
    pub replay_path: Option<PathBuf>,
    pub confidence: f32,
    pub iou: f32,
    pub input_size: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            kind: DetectorKind::None,
            model_path: None,
            replay_path: None,
            confidence: DEFAULT_CONFIDENCE,
            iou: DEFAULT_IOU,
            input_size: DEFAULT_INPUT_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OccupancySettings {
    pub seat_classes: Vec<ObjectClass>,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub font_path: Option<PathBuf>,
    pub style: RenderStyle,
}

#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub enabled: bool,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSettings {
    /// Recording is off when `None`.
    pub path: Option<PathBuf>,
    pub format: RecordingFormat,
}

/// Command-line values that take precedence over the file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source: Option<String>,
    pub detector: Option<DetectorKind>,
    pub model: Option<PathBuf>,
    pub replay: Option<PathBuf>,
    pub record: Option<PathBuf>,
    pub record_format: Option<RecordingFormat>,
    pub font: Option<PathBuf>,
    pub seat_classes: Vec<String>,
    pub no_display: bool,
}

impl AppConfig {
    /// Resolve configuration: file (explicit path or `TABLEWATCH_CONFIG`), then
    /// `TABLEWATCH_*` environment variables, then `overrides`, then validate.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let env_path = std::env::var("TABLEWATCH_CONFIG")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let file_cfg = match config_path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Some(read_config_file(&path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.apply_overrides(overrides)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AppConfigFile) -> Result<Self> {
        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            path: source_file.path.unwrap_or_default(),
            fps: source_file.fps.unwrap_or(DEFAULT_FPS),
        };

        let detector_file = file.detector.unwrap_or_default();
        let defaults = DetectorSettings::default();
        let detector = DetectorSettings {
            kind: detector_file.backend.unwrap_or(defaults.kind),
            model_path: detector_file.model,
            replay_path: detector_file.replay,
            confidence: detector_file.confidence.unwrap_or(defaults.confidence),
            iou: detector_file.iou.unwrap_or(defaults.iou),
            input_size: detector_file.input_size.unwrap_or(defaults.input_size),
        };

        let seat_classes = match file.occupancy.and_then(|o| o.seat_classes) {
            Some(names) => parse_seat_classes(names.as_slice())?,
            None => vec![ObjectClass::Chair],
        };

        let render_file = file.render.unwrap_or_default();
        let base = RenderStyle::default();
        let render = RenderSettings {
            font_path: render_file.font,
            style: RenderStyle {
                stroke_width: render_file.stroke_width.unwrap_or(base.stroke_width),
                label_scale: render_file.label_scale.unwrap_or(base.label_scale),
                caption_scale: render_file.caption_scale.unwrap_or(base.caption_scale),
                count_scale: render_file.count_scale.unwrap_or(base.count_scale),
                margin_x: render_file.margin_x.unwrap_or(base.margin_x),
                margin_y: render_file.margin_y.unwrap_or(base.margin_y),
                ..base
            },
        };

        let display_file = file.display.unwrap_or_default();
        let display = DisplaySettings {
            enabled: display_file.enabled.unwrap_or(true),
            title: display_file
                .title
                .unwrap_or_else(|| DEFAULT_WINDOW_TITLE.to_string()),
        };

        let recording_file = file.recording.unwrap_or_default();
        let recording = RecordingSettings {
            path: recording_file.path,
            format: recording_file.format.unwrap_or_default(),
        };

        Ok(Self {
            source,
            detector,
            occupancy: OccupancySettings { seat_classes },
            render,
            display,
            recording,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(source) = env_value("TABLEWATCH_SOURCE") {
            self.source.path = source;
        }
        if let Some(kind) = env_value("TABLEWATCH_DETECTOR") {
            self.detector.kind = kind.parse()?;
        }
        if let Some(model) = env_value("TABLEWATCH_MODEL") {
            self.detector.model_path = Some(PathBuf::from(model));
        }
        if let Some(replay) = env_value("TABLEWATCH_REPLAY") {
            self.detector.replay_path = Some(PathBuf::from(replay));
        }
        if let Some(record) = env_value("TABLEWATCH_RECORD") {
            self.recording.path = Some(PathBuf::from(record));
        }
        if let Some(font) = env_value("TABLEWATCH_FONT") {
            self.render.font_path = Some(PathBuf::from(font));
        }
        if let Some(seats) = env_value("TABLEWATCH_SEAT_CLASSES") {
            let parsed = split_csv(&seats);
            if !parsed.is_empty() {
                self.occupancy.seat_classes = parse_seat_classes(parsed.as_slice())?;
            }
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &Overrides) -> Result<()> {
        if let Some(source) = &overrides.source {
            self.source.path = source.clone();
        }
        if let Some(kind) = overrides.detector {
            self.detector.kind = kind;
        }
        if let Some(model) = &overrides.model {
            self.detector.model_path = Some(model.clone());
        }
        if let Some(replay) = &overrides.replay {
            self.detector.replay_path = Some(replay.clone());
        }
        if let Some(record) = &overrides.record {
            self.recording.path = Some(record.clone());
        }
        if let Some(format) = overrides.record_format {
            self.recording.format = format;
        }
        if let Some(font) = &overrides.font {
            self.render.font_path = Some(font.clone());
        }
        if !overrides.seat_classes.is_empty() {
            self.occupancy.seat_classes = parse_seat_classes(overrides.seat_classes.as_slice())?;
        }
        if overrides.no_display {
            self.display.enabled = false;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.source.path = self.source.path.trim().to_string();
        if self.source.path.is_empty() {
            return Err(anyhow!(
                "no video source configured (pass a path, or set TABLEWATCH_SOURCE)"
            ));
        }
        if !(self.source.fps.is_finite() && self.source.fps > 0.0) {
            return Err(anyhow!("source fps must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.detector.confidence) {
            return Err(anyhow!("detector confidence must be within 0..=1"));
        }
        if !(0.0..=1.0).contains(&self.detector.iou) {
            return Err(anyhow!("detector iou must be within 0..=1"));
        }
        if self.detector.input_size == 0 {
            return Err(anyhow!("detector input_size must be greater than zero"));
        }
        if self.occupancy.seat_classes.is_empty() {
            return Err(anyhow!("at least one seat class is required"));
        }
        self.occupancy.seat_classes.dedup();
        if !(1..=MAX_STROKE_WIDTH).contains(&self.render.style.stroke_width) {
            return Err(anyhow!(
                "render stroke_width must be within 1..={}",
                MAX_STROKE_WIDTH
            ));
        }
        let scales = [
            self.render.style.label_scale,
            self.render.style.caption_scale,
            self.render.style.count_scale,
        ];
        if scales.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(anyhow!("render text scales must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_seat_classes<S: AsRef<str>>(names: &[S]) -> Result<Vec<ObjectClass>> {
    let mut classes = Vec::new();
    for name in names {
        let name = name.as_ref();
        let class = ObjectClass::from_label(name)
            .filter(|class| class.can_mark_seat())
            .ok_or_else(|| {
                anyhow!(
                    "invalid seat class '{}' (expected chair or person)",
                    name.trim()
                )
            })?;
        if !classes.contains(&class) {
            classes.push(class);
        }
    }
    Ok(classes)
}

fn read_config_file(path: &Path) -> Result<AppConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
