//! Scenario model and its on-disk form.
//!
//! A scenario is a list of slides, each with a keyframe path in viewport
//! coordinates. YAML is the primary format; JSON with the same schema is
//! accepted for tooling that prefers it.

use pagecast_core::{PagecastError, Rect, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Schema version written into every scenario.
pub const SCENARIO_VERSION: &str = "1.0";

/// Focus label for an unzoomed view of the whole page.
pub const FULL_VIEW: &str = "full_view";

/// Focus label for the hold injected before the final zoom-out.
pub const ZOOM_OUT_START: &str = "zoom_out_start";

// ── Model ───────────────────────────────────────────────────────

/// A camera anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Seconds from the start of the slide.
    pub time: f64,
    /// Free-form label, e.g. `full_view` or `region_3`.
    pub focus: String,
    /// Target rectangle in viewport pixels.
    pub rect: Rect,
    pub zoom: f64,
}

impl Keyframe {
    pub fn new(time: f64, focus: impl Into<String>, rect: Rect, zoom: f64) -> Self {
        Self {
            time,
            focus: focus.into(),
            rect,
            zoom,
        }
    }

    /// Unzoomed view of the whole `width`×`height` viewport.
    pub fn full_view(time: f64, width: u32, height: u32) -> Self {
        Self::new(time, FULL_VIEW, Rect::full(width, height), 1.0)
    }

    /// Zoom 1.0 and a rectangle starting at the origin.
    pub fn is_full_view(&self) -> bool {
        self.zoom == 1.0 && self.rect.x == 0 && self.rect.y == 0
    }

    /// Same pose at a different time and label.
    fn frozen_at(&self, time: f64, focus: &str) -> Self {
        Self::new(time, focus, self.rect, self.zoom)
    }
}

/// The camera plan for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: u32,
    /// Source reference (file name or page label).
    pub input: String,
    /// Authored duration in seconds.
    pub duration: f64,
    pub keyframes: Vec<Keyframe>,
}

impl Slide {
    /// A slide that stays on the full page.
    pub fn static_view(id: u32, input: impl Into<String>, duration: f64, width: u32, height: u32) -> Self {
        Self {
            id,
            input: input.into(),
            duration,
            keyframes: vec![Keyframe::full_view(0.0, width, height)],
        }
    }

    /// True when keyframe times never go backwards.
    pub fn is_monotonic(&self) -> bool {
        self.keyframes.windows(2).all(|w| w[0].time <= w[1].time)
    }

    /// Retime this slide to a computed clip length.
    ///
    /// Keyframe times are scaled by `duration / self.duration`. When there is
    /// room before the transition, the camera then freezes at its current pose
    /// at `duration - fade - outro`, returns to full view by `duration - fade`,
    /// and holds full view through the end. Keyframes the freeze supersedes are
    /// dropped, and the result is stably sorted by time.
    pub fn fit_to_timing(&self, duration: f64, fade: f64, outro: f64, viewport: (u32, u32)) -> Slide {
        let scale = if self.duration > 0.0 {
            duration / self.duration
        } else {
            1.0
        };
        let mut keyframes: Vec<Keyframe> = self
            .keyframes
            .iter()
            .map(|k| Keyframe {
                time: k.time * scale,
                ..k.clone()
            })
            .collect();

        let fade_start = duration - fade;
        let zoom_out_start = fade_start - outro;

        if zoom_out_start > 0.0 {
            let (w, h) = viewport;
            let freeze = keyframes
                .iter()
                .rev()
                .find(|k| k.time <= zoom_out_start)
                .map(|k| k.frozen_at(zoom_out_start, ZOOM_OUT_START))
                .unwrap_or_else(|| Keyframe {
                    focus: ZOOM_OUT_START.into(),
                    ..Keyframe::full_view(zoom_out_start, w, h)
                });

            keyframes.retain(|k| k.time <= zoom_out_start);
            keyframes.push(freeze);
            keyframes.push(Keyframe::full_view(fade_start, w, h));
            keyframes.push(Keyframe::full_view(duration, w, h));
        }

        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));

        Slide {
            id: self.id,
            input: self.input.clone(),
            duration,
            keyframes,
        }
    }
}

/// A versioned list of slides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub version: String,
    pub slides: Vec<Slide>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Scenario {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self {
            version: SCENARIO_VERSION.to_string(),
            slides,
        }
    }

    /// Slide for a zero-based page index.
    pub fn slide(&self, page_index: usize) -> Option<&Slide> {
        self.slides.get(page_index)
    }
}

// ── Persistence ─────────────────────────────────────────────────

/// On-disk encoding of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenarioFormat {
    #[default]
    Yaml,
    Json,
}

impl ScenarioFormat {
    /// `.json` selects JSON; anything else is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

impl Scenario {
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| PagecastError::Serialization(format!("Failed to serialize scenario: {e}")))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(text)
            .map_err(|e| PagecastError::Serialization(format!("Invalid scenario YAML: {e}")))?;
        scenario.check_version()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PagecastError::Serialization(format!("Failed to serialize scenario: {e}")))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(text)
            .map_err(|e| PagecastError::Serialization(format!("Invalid scenario JSON: {e}")))?;
        scenario.check_version()
    }

    /// Write to `path`, picking the format from its extension.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let text = match ScenarioFormat::from_path(path) {
            ScenarioFormat::Yaml => self.to_yaml()?,
            ScenarioFormat::Json => self.to_json()?,
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Read from `path`, picking the format from its extension.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PagecastError::NotFound(format!(
                "Scenario not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        match ScenarioFormat::from_path(path) {
            ScenarioFormat::Yaml => Self::from_yaml(&text),
            ScenarioFormat::Json => Self::from_json(&text),
        }
    }

    /// Accept any 1.x scenario.
    fn check_version(self) -> Result<Self> {
        let major = self.version.split('.').next().unwrap_or_default();
        if major != "1" {
            return Err(PagecastError::Serialization(format!(
                "Scenario version {} is not supported (expected {})",
                self.version, SCENARIO_VERSION
            )));
        }
        Ok(self)
    }
}
