//! Run configuration.
//!
//! A [`Config`] is loaded from JSON (or built from defaults), overridden by
//! the CLI, validated once, and never mutated after the run starts. Values
//! derived during the run live in [`crate::RenderPlan`].

use pagecast_analysis::{ContrastConfig, DetectorVariant};
use pagecast_core::{PagecastError, Result, Transition, ZoomMode};
use pagecast_media::{AssemblySettings, VideoEncoder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Region detector used for scenario generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzeMode {
    #[default]
    Contrast,
    Ocr,
    Ai,
}

impl AnalyzeMode {
    pub fn as_str(self) -> &'static str {
        self.variant().as_str()
    }

    pub fn variant(self) -> DetectorVariant {
        match self {
            Self::Contrast => DetectorVariant::Contrast,
            Self::Ocr => DetectorVariant::Ocr,
            Self::Ai => DetectorVariant::Ai,
        }
    }
}

impl fmt::Display for AnalyzeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyzeMode {
    type Err = PagecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "contrast" => Ok(Self::Contrast),
            "ocr" => Ok(Self::Ocr),
            "ai" => Ok(Self::Ai),
            other => Err(PagecastError::Config(format!("unknown analyze mode '{other}'"))),
        }
    }
}

/// Output frame-size presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectPreset {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:5")]
    Social,
}

impl AspectPreset {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Landscape => (1280, 720),
            Self::Portrait => (720, 1280),
            Self::Social => (1080, 1350),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Social => "4:5",
        }
    }
}

impl fmt::Display for AspectPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectPreset {
    type Err = PagecastError;

    fn from_str(s: &str) -> Result<Self> {
        [Self::Landscape, Self::Portrait, Self::Social]
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PagecastError::Config(format!("unknown preset '{s}' (use 16:9, 9:16 or 4:5)")))
    }
}

/// Settings for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page image file or directory.
    pub input: PathBuf,
    pub output: PathBuf,

    /// Visible video length in seconds. `0` derives it from `page_duration`.
    pub total_duration: f64,
    /// Seconds per page when no total is given.
    pub page_duration: f64,

    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub preset: Option<AspectPreset>,
    /// Match the output width to the first page's aspect ratio.
    pub auto_aspect: bool,
    pub dpi: u32,

    /// Render threads.
    pub workers: usize,
    /// Concurrent encoder processes.
    pub encode_workers: usize,

    pub fade_duration: f64,
    pub transition: Transition,
    /// Full-view hold before each transition.
    pub outro_duration: f64,
    pub zoom_mode: ZoomMode,
    pub zoom_speed: f64,

    /// Narration track.
    pub audio: Option<PathBuf>,
    /// Set the total duration from the narration length.
    pub audio_sync: bool,
    pub background_audio: Option<PathBuf>,
    pub background_volume: f64,

    pub encoder: VideoEncoder,
    pub quality: u32,

    pub analyze_mode: AnalyzeMode,
    pub min_block_area: i64,
    pub edge_threshold: f32,

    /// Write a scenario instead of rendering a video.
    pub generate_scenario: bool,
    pub scenario_output: Option<PathBuf>,
    /// Drive motion from a scenario file.
    pub scenario_input: Option<PathBuf>,

    /// Overlay slide labels and region boxes.
    pub debug: bool,
    pub show_stats: bool,
    /// Fixed RNG seed for durations and random anchors.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::from("output.mp4"),
            total_duration: 0.0,
            page_duration: 3.0,
            width: 1280,
            height: 720,
            fps: 30,
            preset: None,
            auto_aspect: true,
            dpi: 300,
            workers: num_cpus::get(),
            encode_workers: 4,
            fade_duration: 0.5,
            transition: Transition::Fade,
            outro_duration: 0.0,
            zoom_mode: ZoomMode::Center,
            zoom_speed: 0.001,
            audio: None,
            audio_sync: true,
            background_audio: None,
            background_volume: 0.3,
            encoder: VideoEncoder::Libx264,
            quality: 23,
            analyze_mode: AnalyzeMode::Contrast,
            min_block_area: 500,
            edge_threshold: 30.0,
            generate_scenario: false,
            scenario_output: None,
            scenario_input: None,
            debug: false,
            show_stats: false,
            seed: None,
        }
    }
}

fn check_range(name: &str, value: f64, ok: bool) -> Result<()> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(PagecastError::Config(format!("{name} out of range (got {value})")))
    }
}

impl Config {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PagecastError::NotFound(format!(
                "Config not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| PagecastError::Serialization(format!("Invalid config {}: {e}", path.display())))
    }

    /// Write as pretty JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| PagecastError::Serialization(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Frame size after applying the preset, before auto-aspect.
    pub fn frame_size(&self) -> (u32, u32) {
        self.preset
            .map(AspectPreset::dimensions)
            .unwrap_or((self.width, self.height))
    }

    /// Reject settings that cannot produce a video. Nothing runs before this.
    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.frame_size();
        if w == 0 || w % 2 != 0 {
            return Err(PagecastError::Config(format!("width must be positive and even (got {w})")));
        }
        if h == 0 || h % 2 != 0 {
            return Err(PagecastError::Config(format!("height must be positive and even (got {h})")));
        }
        if !(1..=120).contains(&self.fps) {
            return Err(PagecastError::Config(format!("fps must be between 1 and 120 (got {})", self.fps)));
        }
        if !(72..=1200).contains(&self.dpi) {
            return Err(PagecastError::Config(format!("dpi must be between 72 and 1200 (got {})", self.dpi)));
        }
        if self.workers < 1 {
            return Err(PagecastError::Config("workers must be at least 1".into()));
        }
        if self.encode_workers < 1 {
            return Err(PagecastError::Config("encode workers must be at least 1".into()));
        }
        check_range("fade duration", self.fade_duration, self.fade_duration >= 0.0)?;
        check_range("outro duration", self.outro_duration, self.outro_duration >= 0.0)?;
        check_range("zoom speed", self.zoom_speed, self.zoom_speed > 0.0)?;
        check_range("total duration", self.total_duration, self.total_duration >= 0.0)?;
        check_range("page duration", self.page_duration, self.page_duration > 0.0)?;
        check_range(
            "background volume",
            self.background_volume,
            (0.0..=1.0).contains(&self.background_volume),
        )?;
        if self.generate_scenario && self.scenario_input.is_some() {
            return Err(PagecastError::Config(
                "scenario input and scenario generation are mutually exclusive".into(),
            ));
        }
        Ok(())
    }

    pub fn contrast_config(&self) -> ContrastConfig {
        ContrastConfig {
            min_block_area: self.min_block_area,
            edge_threshold: self.edge_threshold,
            ..ContrastConfig::default()
        }
    }

    /// Assembly settings for a planned run.
    pub fn assembly_settings(&self, durations: &[f64], fade: f64, total: f64) -> AssemblySettings {
        AssemblySettings {
            transition: self.transition,
            fade_duration: fade,
            durations: durations.to_vec(),
            total_duration: total,
            audio: self.audio.clone(),
            background_audio: self.background_audio.clone(),
            background_volume: self.background_volume,
            encoder: self.encoder,
            quality: self.quality,
        }
    }

    /// Where generated scenarios are written.
    pub fn scenario_output_path(&self) -> PathBuf {
        self.scenario_output
            .clone()
            .unwrap_or_else(|| PathBuf::from("scenarios/scenario.yaml"))
    }
}
