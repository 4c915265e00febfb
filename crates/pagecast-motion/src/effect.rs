//! Per-segment filter chains.
//!
//! Every chain has the same shape: letterbox the page onto a canvas
//! [`SUPERSAMPLE`] times the output size, run `zoompan` over it, and scale
//! back down. Supersampling keeps slow zooms from stepping visibly.

use crate::zoompan::{debug_box_filter, zoompan_filter_scaled};
use pagecast_core::{SegmentParams, ZoomMode};
use pagecast_director::{Keyframe, Scenario};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Canvas multiplier for the zoompan input.
pub const SUPERSAMPLE: u32 = 2;

/// Produces the ffmpeg `-vf` chain for one segment.
pub trait Effect: Send + Sync {
    fn filter(&self, params: &SegmentParams) -> String;
}

/// Wrap a motion filter in the letterbox/supersample/downscale stages.
pub fn aspect_wrap(params: &SegmentParams, motion: &str) -> String {
    let (w, h) = (params.width, params.height);
    let (sw, sh) = (w * SUPERSAMPLE, h * SUPERSAMPLE);
    let mut chain = format!(
        "scale={sw}:{sh}:force_original_aspect_ratio=decrease,pad={sw}:{sh}:(ow-iw)/2:(oh-ih)/2,{motion},scale={w}:{h}"
    );
    if params.debug.label {
        chain.push_str(&format!(
            ",drawtext=text='Slide {}':x=10:y=10:fontsize=24:fontcolor=yellow:box=1:boxcolor=black@0.5",
            params.page_index + 1
        ));
    }
    chain
}

// ── Breathing ───────────────────────────────────────────────────

/// Zoom increment used when the configured speed is not positive.
const DEFAULT_ZOOM_SPEED: f64 = 0.001;

/// Highest zoom the breathing motion may reach.
const MAX_BREATH_ZOOM: f64 = 1.5;

/// Default motion when no scenario is loaded: zoom in, hold, and return to
/// 1.0 before the transition.
#[derive(Debug, Clone, Default)]
pub struct BreathingEffect {
    /// Fixed seed for randomized anchors. `None` seeds from the wall clock.
    seed: Option<u64>,
}

impl BreathingEffect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// Resolve `random` modes to a concrete anchor for this page.
    pub fn anchor_for(&self, mode: ZoomMode, page_index: usize) -> ZoomMode {
        if !mode.is_random() {
            return mode;
        }
        let base = self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        });
        let mut rng = StdRng::seed_from_u64(base.wrapping_add(page_index as u64 * 99));
        ZoomMode::FIXED[rng.random_range(0..ZoomMode::FIXED.len())]
    }

    /// Zoom expression over output frame `on`.
    pub fn zoom_expr(params: &SegmentParams) -> String {
        let fps = params.fps as f64;
        let total = params.duration * fps;
        let fade = params.fade_duration * fps;
        let outro = params.outro_duration * fps;
        let speed = if params.zoom_speed > 0.0 {
            params.zoom_speed
        } else {
            DEFAULT_ZOOM_SPEED
        };

        let mut active = total - fade;
        if active <= 0.0 {
            active = total;
        }

        let mut on_peak = 0.5 / speed;
        let room = (active - outro) / 2.0;
        if room > 0.0 && room < on_peak {
            on_peak = room;
        }
        let mut peak = 1.0 + speed * on_peak;
        if peak > MAX_BREATH_ZOOM {
            peak = MAX_BREATH_ZOOM;
            on_peak = (MAX_BREATH_ZOOM - 1.0) / speed;
        }

        let outro_start = (active - outro).max(on_peak);
        let ramp = (active - outro_start).max(1.0);

        format!(
            "if(lte(on,{on_peak:.2}),1.0+({speed:.6}*on),\
             if(lte(on,{outro_start:.2}),{peak:.6},\
             if(lte(on,{active:.2}),{peak:.6}-({peak:.6}-1.0)*(on-{outro_start:.2})/{ramp:.2},1.0)))"
        )
    }

    /// Pan expressions anchoring the zoom on a corner or the center.
    pub fn pan_exprs(anchor: ZoomMode) -> (&'static str, &'static str) {
        match anchor {
            ZoomMode::TopLeft => ("0", "0"),
            ZoomMode::TopRight => ("iw-(iw/zoom)", "0"),
            ZoomMode::BottomLeft => ("0", "ih-(ih/zoom)"),
            ZoomMode::BottomRight => ("iw-(iw/zoom)", "ih-(ih/zoom)"),
            ZoomMode::Center | ZoomMode::OutCenter | ZoomMode::Random | ZoomMode::OutRandom => {
                ("iw/2-(iw/zoom/2)", "ih/2-(ih/zoom/2)")
            }
        }
    }
}

impl Effect for BreathingEffect {
    fn filter(&self, params: &SegmentParams) -> String {
        let anchor = self.anchor_for(params.zoom_mode, params.page_index);
        let (x, y) = Self::pan_exprs(anchor);
        let frames = params.total_frames().max(1);
        let zoompan = format!(
            "zoompan=z='{}':x='{x}':y='{y}':d={frames}:s={}x{}:fps={}",
            Self::zoom_expr(params),
            params.width,
            params.height,
            params.fps
        );
        debug!(page = params.page_index, anchor = %anchor, "Breathing zoom");
        aspect_wrap(params, &zoompan)
    }
}

// ── Scenario ────────────────────────────────────────────────────

/// Motion driven by an authored or generated scenario.
#[derive(Debug, Clone)]
pub struct ScenarioEffect {
    scenario: Arc<Scenario>,
}

impl ScenarioEffect {
    pub fn new(scenario: Arc<Scenario>) -> Self {
        Self { scenario }
    }

    /// Keyframes for a segment, retimed to its actual duration.
    ///
    /// Pages beyond the scenario get a single full-view keyframe.
    pub fn keyframes_for(&self, params: &SegmentParams) -> Vec<Keyframe> {
        let viewport = (params.width, params.height);
        match self.scenario.slide(params.page_index) {
            Some(slide) => {
                slide
                    .fit_to_timing(params.duration, params.fade_duration, params.outro_duration, viewport)
                    .keyframes
            }
            None => vec![Keyframe::full_view(0.0, params.width, params.height)],
        }
    }
}

impl Effect for ScenarioEffect {
    fn filter(&self, params: &SegmentParams) -> String {
        let keyframes = self.keyframes_for(params);
        let zoompan = zoompan_filter_scaled(
            &keyframes,
            params.duration,
            params.fps,
            params.width,
            params.height,
            SUPERSAMPLE,
        );

        let boxes = if params.debug.boxes {
            debug_box_filter(&keyframes, params.fps, params.width, params.height)
        } else {
            String::new()
        };
        let motion = if boxes.is_empty() {
            zoompan
        } else {
            format!("{zoompan},{boxes}")
        };

        debug!(page = params.page_index, keyframes = keyframes.len(), "Scenario motion");
        aspect_wrap(params, &motion)
    }
}
