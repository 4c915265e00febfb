//! Per-page render parameters and the named options they carry.

use crate::error::PagecastError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Zoom mode ───────────────────────────────────────────────────

/// Where the default breathing zoom is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoomMode {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// A corner or center picked per page.
    Random,
    /// Same anchoring as `Center`; the zoom already returns to 1.0 before the transition.
    OutCenter,
    /// Same anchoring as `Random`.
    OutRandom,
}

impl ZoomMode {
    pub const ALL: [ZoomMode; 8] = [
        Self::Center,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::Random,
        Self::OutCenter,
        Self::OutRandom,
    ];

    /// Anchors a randomized mode can resolve to.
    pub const FIXED: [ZoomMode; 5] = [
        Self::Center,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    pub fn is_random(self) -> bool {
        matches!(self, Self::Random | Self::OutRandom)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Random => "random",
            Self::OutCenter => "out-center",
            Self::OutRandom => "out-random",
        }
    }
}

impl fmt::Display for ZoomMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoomMode {
    type Err = PagecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| PagecastError::Config(format!("unknown zoom mode '{s}'")))
    }
}

// ── Transition ──────────────────────────────────────────────────

/// Cross-fade style between consecutive segments (ffmpeg `xfade` names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    Fade,
    WipeLeft,
    WipeRight,
    WipeUp,
    WipeDown,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    CircleCrop,
    RectCrop,
    Distance,
    FadeBlack,
    FadeWhite,
    Radial,
    SmoothStep,
    CircularReveal,
    Pixelize,
    Dissolve,
    /// Hard cuts.
    None,
}

impl Transition {
    pub const ALL: [Transition; 20] = [
        Self::Fade,
        Self::WipeLeft,
        Self::WipeRight,
        Self::WipeUp,
        Self::WipeDown,
        Self::SlideLeft,
        Self::SlideRight,
        Self::SlideUp,
        Self::SlideDown,
        Self::CircleCrop,
        Self::RectCrop,
        Self::Distance,
        Self::FadeBlack,
        Self::FadeWhite,
        Self::Radial,
        Self::SmoothStep,
        Self::CircularReveal,
        Self::Pixelize,
        Self::Dissolve,
        Self::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::WipeLeft => "wipeleft",
            Self::WipeRight => "wiperight",
            Self::WipeUp => "wipeup",
            Self::WipeDown => "wipedown",
            Self::SlideLeft => "slideleft",
            Self::SlideRight => "slideright",
            Self::SlideUp => "slideup",
            Self::SlideDown => "slidedown",
            Self::CircleCrop => "circlecrop",
            Self::RectCrop => "rectcrop",
            Self::Distance => "distance",
            Self::FadeBlack => "fadeblack",
            Self::FadeWhite => "fadewhite",
            Self::Radial => "radial",
            Self::SmoothStep => "smoothstep",
            Self::CircularReveal => "circularreveal",
            Self::Pixelize => "pixelize",
            Self::Dissolve => "dissolve",
            Self::None => "none",
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transition {
    type Err = PagecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PagecastError::Config(format!("unknown transition '{s}'")))
    }
}

// ── Debug overlays ──────────────────────────────────────────────

/// Diagnostic drawing burned into each clip when debugging.
///
/// Each overlay needs its ffmpeg filter in the encoder build, so the two are
/// switched separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DebugOverlays {
    /// Page and frame label (`drawtext`).
    pub label: bool,
    /// Camera target outline (`drawbox`).
    pub boxes: bool,
}

impl DebugOverlays {
    pub const OFF: Self = Self {
        label: false,
        boxes: false,
    };
    pub const ALL: Self = Self {
        label: true,
        boxes: true,
    };

    pub fn any(self) -> bool {
        self.label || self.boxes
    }
}

// ── Segment parameters ──────────────────────────────────────────

/// Everything the encode stage needs to turn one page into one clip.
///
/// Built fresh per job and never mutated once handed to the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentParams {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Clip length in seconds, including the trailing transition overlap.
    pub duration: f64,
    pub fade_duration: f64,
    pub outro_duration: f64,
    pub zoom_mode: ZoomMode,
    /// Breathing zoom increment per frame.
    pub zoom_speed: f64,
    pub page_index: usize,
    pub debug: DebugOverlays,
    /// ffmpeg `-vf` chain. Empty until an effect fills it in.
    pub filter: String,
}

impl SegmentParams {
    /// Frame count of the clip (truncating).
    pub fn total_frames(&self) -> u64 {
        (self.duration * self.fps as f64) as u64
    }

    pub fn with_filter(mut self, filter: String) -> Self {
        self.filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_mode_round_trip_names() {
        for mode in ZoomMode::ALL {
            assert_eq!(mode.as_str().parse::<ZoomMode>().unwrap(), mode);
        }
        assert!("sideways".parse::<ZoomMode>().is_err());
    }

    #[test]
    fn test_random_modes() {
        assert!(ZoomMode::Random.is_random());
        assert!(ZoomMode::OutRandom.is_random());
        assert!(!ZoomMode::OutCenter.is_random());
    }

    #[test]
    fn test_transition_names() {
        assert_eq!("circularreveal".parse::<Transition>().unwrap(), Transition::CircularReveal);
        assert!("none".parse::<Transition>().unwrap().is_none());
        let err = "starwipe".parse::<Transition>().unwrap_err();
        assert!(matches!(err, PagecastError::Config(_)));
    }

    #[test]
    fn test_total_frames_truncates() {
        let params = SegmentParams {
            width: 1280,
            height: 720,
            fps: 30,
            duration: 5.49,
            fade_duration: 0.5,
            outro_duration: 0.0,
            zoom_mode: ZoomMode::Center,
            zoom_speed: 0.001,
            page_index: 0,
            debug: DebugOverlays::OFF,
            filter: String::new(),
        };
        assert_eq!(params.total_frames(), 164);
    }

    #[test]
    fn test_debug_overlays() {
        assert!(!DebugOverlays::OFF.any());
        assert!(DebugOverlays::ALL.any());
        assert_eq!(DebugOverlays::default(), DebugOverlays::OFF);
        let boxes_only = DebugOverlays {
            label: false,
            boxes: true,
        };
        assert!(boxes_only.any());
    }
}
