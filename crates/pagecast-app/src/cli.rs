//! Command-line arguments and how they override a loaded [`Config`].

use clap::Parser;
use pagecast_core::{Transition, ZoomMode};
use pagecast_engine::{AnalyzeMode, AspectPreset, Config};
use pagecast_media::{detect_best_encoder, VideoEncoder};
use std::path::PathBuf;

/// Turn a slide deck into a narrated, pan-and-zoom video
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Page image or directory of page images (PNG, JPEG)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output video path
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Load settings from a JSON config; flags override it
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Total video length in seconds (0 = pages x page duration)
    #[arg(short = 'd', long = "duration", value_name = "SECS")]
    pub duration: Option<f64>,

    /// Seconds per page when no total is given
    #[arg(long = "page-duration", value_name = "SECS")]
    pub page_duration: Option<f64>,

    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    #[arg(long, value_name = "N")]
    pub fps: Option<u32>,

    /// Output size preset: 16:9, 9:16 or 4:5
    #[arg(long, value_name = "RATIO")]
    pub preset: Option<AspectPreset>,

    /// Keep the configured width instead of matching the first page
    #[arg(long = "no-auto-aspect")]
    pub no_auto_aspect: bool,

    /// Rasterization density
    #[arg(long, value_name = "DPI")]
    pub dpi: Option<u32>,

    /// Render threads
    #[arg(short = 'w', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Concurrent encoder processes
    #[arg(long = "encode-workers", value_name = "N")]
    pub encode_workers: Option<usize>,

    /// Transition length in seconds
    #[arg(long, value_name = "SECS")]
    pub fade: Option<f64>,

    /// Transition between pages (fade, wipeleft, ..., none)
    #[arg(short = 't', long, value_name = "NAME")]
    pub transition: Option<Transition>,

    /// Full-view hold before each transition, in seconds
    #[arg(long, value_name = "SECS")]
    pub outro: Option<f64>,

    /// Breathing anchor: center, top-left, ..., random, out-center, out-random
    #[arg(short = 'z', long = "zoom-mode", value_name = "MODE")]
    pub zoom_mode: Option<ZoomMode>,

    #[arg(long = "zoom-speed", value_name = "RATE")]
    pub zoom_speed: Option<f64>,

    /// Narration track
    #[arg(short = 'a', long, value_name = "FILE")]
    pub audio: Option<PathBuf>,

    /// Keep the planned duration instead of matching the narration
    #[arg(long = "no-audio-sync")]
    pub no_audio_sync: bool,

    /// Looping background music
    #[arg(long = "background-audio", value_name = "FILE")]
    pub background_audio: Option<PathBuf>,

    /// Background music volume in [0, 1]
    #[arg(long = "background-volume", value_name = "VOL")]
    pub background_volume: Option<f64>,

    /// Video encoder, or "auto" to pick the best available
    #[arg(short = 'e', long, value_name = "NAME")]
    pub encoder: Option<String>,

    #[arg(short = 'q', long, value_name = "Q")]
    pub quality: Option<u32>,

    /// Region detector for scenario generation: contrast, ocr, ai
    #[arg(long = "analyze-mode", value_name = "MODE")]
    pub analyze_mode: Option<AnalyzeMode>,

    #[arg(long = "min-block-area", value_name = "PX")]
    pub min_block_area: Option<i64>,

    #[arg(long = "edge-threshold", value_name = "T")]
    pub edge_threshold: Option<f32>,

    /// Write a scenario file instead of a video
    #[arg(long = "generate-scenario")]
    pub generate_scenario: bool,

    /// Where to write the generated scenario
    #[arg(long = "scenario-output", value_name = "FILE")]
    pub scenario_output: Option<PathBuf>,

    /// Drive camera motion from a scenario file
    #[arg(short = 's', long = "scenario", value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Overlay slide labels and region boxes
    #[arg(long)]
    pub debug: bool,

    /// Print timings and append them to benchmark.log
    #[arg(long)]
    pub stats: bool,

    /// Fixed seed for durations and random anchors
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    /// Overlay every flag that was given onto `config`.
    ///
    /// An explicit width, height or preset turns auto-aspect off.
    pub fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(d) = self.duration {
            config.total_duration = d;
        }
        if let Some(d) = self.page_duration {
            config.page_duration = d;
        }

        if let Some(w) = self.width {
            config.width = w;
            config.auto_aspect = false;
        }
        if let Some(h) = self.height {
            config.height = h;
            config.auto_aspect = false;
        }
        if let Some(preset) = self.preset {
            config.preset = Some(preset);
            config.auto_aspect = false;
        }
        if self.no_auto_aspect {
            config.auto_aspect = false;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(n) = self.workers {
            config.workers = n;
        }
        if let Some(n) = self.encode_workers {
            config.encode_workers = n;
        }

        if let Some(f) = self.fade {
            config.fade_duration = f;
        }
        if let Some(t) = self.transition {
            config.transition = t;
        }
        if let Some(o) = self.outro {
            config.outro_duration = o;
        }
        if let Some(z) = self.zoom_mode {
            config.zoom_mode = z;
        }
        if let Some(s) = self.zoom_speed {
            config.zoom_speed = s;
        }

        if let Some(a) = &self.audio {
            config.audio = Some(a.clone());
        }
        if self.no_audio_sync {
            config.audio_sync = false;
        }
        if let Some(bg) = &self.background_audio {
            config.background_audio = Some(bg.clone());
        }
        if let Some(v) = self.background_volume {
            config.background_volume = v;
        }

        match self.encoder.as_deref() {
            Some("auto") => config.encoder = detect_best_encoder(),
            Some(name) => config.encoder = name.parse::<VideoEncoder>()?,
            None => {}
        }
        if let Some(q) = self.quality {
            config.quality = q;
        }

        if let Some(mode) = self.analyze_mode {
            config.analyze_mode = mode;
        }
        if let Some(area) = self.min_block_area {
            config.min_block_area = area;
        }
        if let Some(t) = self.edge_threshold {
            config.edge_threshold = t;
        }

        if self.generate_scenario {
            config.generate_scenario = true;
        }
        if let Some(path) = &self.scenario_output {
            config.scenario_output = Some(path.clone());
        }
        if let Some(path) = &self.scenario {
            config.scenario_input = Some(path.clone());
        }

        config.debug |= self.debug;
        config.show_stats |= self.stats;
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        Ok(())
    }
}
