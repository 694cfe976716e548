use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::counter::{
    CounterConfig, SideStrategy, Threshold, DEFAULT_MIN_CONFIDENCE, DEFAULT_THRESHOLD_PX,
};
use crate::model::{InputShape, OutputSpace, PixelNormalization, SyntheticMotion, TensorLayout};
use crate::overlay::{OverlaySettings, DEFAULT_MIN_KEYPOINT_SCORE, DEFAULT_MIN_SEGMENT_CONFIDENCE};
use crate::pose::skeleton::EdgeSet;
use crate::pose::TupleLayout;

const DEFAULT_SOURCE_URI: &str = "stub://pushups";
const DEFAULT_SOURCE_FPS: u32 = 15;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_INPUT_SIZE: u32 = 192;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AppConfigFile {
    source: Option<SourceConfigFile>,
    model: Option<ModelConfigFile>,
    counter: Option<CounterConfigFile>,
    display: Option<DisplayConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SourceConfigFile {
    uri: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
    max_frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ModelConfigFile {
    backend: Option<BackendKind>,
    path: Option<PathBuf>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    input_layout: Option<TensorLayout>,
    normalization: Option<PixelNormalization>,
    output_layout: Option<TupleLayout>,
    output_space: Option<OutputSpace>,
    synthetic: Option<SyntheticMotion>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CounterConfigFile {
    threshold_px: Option<f32>,
    threshold_fraction: Option<f32>,
    min_confidence: Option<f32>,
    sides: Option<SideStrategy>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DisplayConfigFile {
    width: Option<u32>,
    height: Option<u32>,
    mirror_x: Option<bool>,
    min_keypoint_score: Option<f32>,
    min_segment_confidence: Option<f32>,
    edges: Option<EdgeSet>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Synthetic,
    Tract,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceSettings,
    pub model: ModelSettings,
    pub counter: CounterConfig,
    pub overlay: OverlaySettings,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// `stub://<name>` for synthetic frames, otherwise a local image directory.
    pub uri: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
    pub max_frames: Option<u64>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            uri: DEFAULT_SOURCE_URI.to_string(),
            width: DEFAULT_SOURCE_WIDTH,
            height: DEFAULT_SOURCE_HEIGHT,
            target_fps: DEFAULT_SOURCE_FPS,
            max_frames: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub backend: BackendKind,
    pub path: Option<PathBuf>,
    pub input: InputShape,
    pub normalization: PixelNormalization,
    pub output_layout: TupleLayout,
    pub output_space: OutputSpace,
    pub motion: SyntheticMotion,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: None,
            input: InputShape::new(DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE),
            normalization: PixelNormalization::default(),
            output_layout: TupleLayout::default(),
            output_space: OutputSpace::default(),
            motion: SyntheticMotion::default(),
        }
    }
}

impl AppConfig {
    /// Load from `PUSHUP_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var("PUSHUP_CONFIG").ok().map(PathBuf::from);
        Self::load_with(path.as_deref())
    }

    /// Load from an explicit file, then apply env overrides.
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => AppConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AppConfigFile) -> Result<Self> {
        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            uri: source_file
                .uri
                .unwrap_or_else(|| DEFAULT_SOURCE_URI.to_string()),
            width: source_file.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: source_file.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            target_fps: source_file.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
            max_frames: source_file.max_frames,
        };

        let model_file = file.model.unwrap_or_default();
        let model = ModelSettings {
            backend: model_file.backend.unwrap_or_default(),
            path: model_file.path,
            input: InputShape {
                width: model_file.input_width.unwrap_or(DEFAULT_INPUT_SIZE),
                height: model_file.input_height.unwrap_or(DEFAULT_INPUT_SIZE),
                layout: model_file.input_layout.unwrap_or_default(),
            },
            normalization: model_file.normalization.unwrap_or_default(),
            output_layout: model_file.output_layout.unwrap_or_default(),
            output_space: model_file.output_space.unwrap_or_default(),
            motion: model_file.synthetic.unwrap_or_default(),
        };

        let counter_file = file.counter.unwrap_or_default();
        let threshold = match (counter_file.threshold_px, counter_file.threshold_fraction) {
            (Some(_), Some(_)) => {
                return Err(anyhow!(
                    "counter.threshold_px and counter.threshold_fraction are mutually exclusive"
                ))
            }
            (Some(px), None) => Threshold::Pixels(px),
            (None, Some(fraction)) => Threshold::FrameFraction(fraction),
            (None, None) => Threshold::Pixels(DEFAULT_THRESHOLD_PX),
        };
        let counter = CounterConfig {
            threshold,
            min_confidence: counter_file.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
            sides: counter_file.sides.unwrap_or_default(),
        };

        let display_file = file.display.unwrap_or_default();
        let overlay = OverlaySettings {
            display_width: display_file.width.unwrap_or(source.width),
            display_height: display_file.height.unwrap_or(source.height),
            mirror_x: display_file.mirror_x.unwrap_or(false),
            min_keypoint_score: display_file
                .min_keypoint_score
                .unwrap_or(DEFAULT_MIN_KEYPOINT_SCORE),
            min_segment_confidence: display_file
                .min_segment_confidence
                .unwrap_or(DEFAULT_MIN_SEGMENT_CONFIDENCE),
            edges: display_file.edges.unwrap_or_default(),
        };

        Ok(Self {
            source,
            model,
            counter,
            overlay,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(uri) = std::env::var("PUSHUP_SOURCE") {
            if !uri.trim().is_empty() {
                self.source.uri = uri;
            }
        }
        if let Ok(backend) = std::env::var("PUSHUP_BACKEND") {
            self.model.backend = match backend.trim() {
                "synthetic" => BackendKind::Synthetic,
                "tract" => BackendKind::Tract,
                other => {
                    return Err(anyhow!(
                        "PUSHUP_BACKEND must be synthetic or tract, got {other}"
                    ))
                }
            };
        }
        if let Ok(path) = std::env::var("PUSHUP_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model.path = Some(PathBuf::from(path));
            }
        }
        if let Ok(px) = std::env::var("PUSHUP_THRESHOLD_PX") {
            let px: f32 = px
                .trim()
                .parse()
                .map_err(|_| anyhow!("PUSHUP_THRESHOLD_PX must be a number of pixels"))?;
            self.counter.threshold = Threshold::Pixels(px);
        }
        if let Ok(conf) = std::env::var("PUSHUP_MIN_CONFIDENCE") {
            self.counter.min_confidence = conf
                .trim()
                .parse()
                .map_err(|_| anyhow!("PUSHUP_MIN_CONFIDENCE must be a number in [0, 1]"))?;
        }
        if let Ok(sides) = std::env::var("PUSHUP_SIDE_STRATEGY") {
            self.counter.sides = match sides.trim() {
                "averaged" => SideStrategy::Averaged,
                "most_confident" => SideStrategy::MostConfident,
                other => {
                    return Err(anyhow!(
                        "PUSHUP_SIDE_STRATEGY must be averaged or most_confident, got {other}"
                    ))
                }
            };
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.counter.validate()?;
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source dimensions must be non-zero"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("source.target_fps must be >= 1"));
        }
        if self.model.input.width == 0 || self.model.input.height == 0 {
            return Err(anyhow!("model input dimensions must be non-zero"));
        }
        if self.model.backend == BackendKind::Tract && self.model.path.is_none() {
            return Err(anyhow!("model.path is required for the tract backend"));
        }
        if self.overlay.display_width == 0 || self.overlay.display_height == 0 {
            return Err(anyhow!("display dimensions must be non-zero"));
        }
        for (name, score) in [
            ("display.min_keypoint_score", self.overlay.min_keypoint_score),
            ("display.min_segment_confidence", self.overlay.min_segment_confidence),
        ] {
            if !(0.0..=1.0).contains(&score) {
                return Err(anyhow!("{name} must be within [0, 1], got {score}"));
            }
        }
        if self.model.motion.period_frames == 0 {
            return Err(anyhow!("model.synthetic.period_frames must be >= 1"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<AppConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    let cfg = if is_toml {
        toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))?
    } else {
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?
    };
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::from_file(AppConfigFile::default()).unwrap();
        assert_eq!(cfg.source.uri, "stub://pushups");
        assert_eq!(cfg.counter.threshold, Threshold::Pixels(50.0));
        assert_eq!(cfg.counter.min_confidence, 0.3);
        assert_eq!(cfg.overlay.display_width, 640);
        assert_eq!(cfg.model.input, InputShape::new(192, 192));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn threshold_units_are_exclusive() {
        let file = AppConfigFile {
            counter: Some(CounterConfigFile {
                threshold_px: Some(40.0),
                threshold_fraction: Some(0.1),
                ..CounterConfigFile::default()
            }),
            ..AppConfigFile::default()
        };
        assert!(AppConfig::from_file(file).is_err());
    }

    #[test]
    fn misspelled_section_keys_are_rejected() {
        let err = toml::from_str::<AppConfigFile>("[counter]\ntreshold_px = 20.0\n").unwrap_err();
        assert!(err.to_string().contains("treshold_px"));
        assert!(serde_json::from_str::<AppConfigFile>(r#"{"display":{"mirror":true}}"#).is_err());
    }

    #[test]
    fn tract_backend_needs_path() {
        let mut cfg = AppConfig::from_file(AppConfigFile::default()).unwrap();
        cfg.model.backend = BackendKind::Tract;
        assert!(cfg.validate().is_err());
        cfg.model.path = Some(PathBuf::from("movenet.onnx"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parses_toml_sections() {
        let file: AppConfigFile = toml::from_str(
            r#"
            [source]
            uri = "stub://gym"
            width = 1280
            height = 720

            [counter]
            threshold_fraction = 0.08
            sides = "most_confident"

            [display]
            edges = "limbs"
            mirror_x = true
            "#,
        )
        .unwrap();
        let cfg = AppConfig::from_file(file).unwrap();
        assert_eq!(cfg.source.uri, "stub://gym");
        assert_eq!(cfg.counter.threshold, Threshold::FrameFraction(0.08));
        assert_eq!(cfg.counter.sides, SideStrategy::MostConfident);
        assert_eq!(cfg.overlay.edges, EdgeSet::Limbs);
        assert_eq!(cfg.overlay.display_width, 1280);
        assert!(cfg.overlay.mirror_x);
    }
}
