//! Render planning.
//!
//! A [`RenderPlan`] is computed once per run by a fixed sequence of pure
//! steps: duration planning, fade guard, auto-aspect. Workers only read it.

use crate::config::Config;
use crate::pipeline::{enter, PipelineStage};
use pagecast_core::{DebugOverlays, PagecastError, Result, SegmentParams};
use pagecast_director::Scenario;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Largest relative change between consecutive clip lengths.
pub const MAX_VARIATION: f64 = 0.15;

/// Random shapes tried before falling back to uniform clips.
const MAX_DRAWS: usize = 64;

/// Clips are never drawn shorter than this multiple of the fade.
const FADE_FLOOR: f64 = 1.1;

const RATIO_EPSILON: f64 = 1e-9;

/// Upper bound on fade-guard replans. One pass almost always suffices.
const MAX_FADE_PASSES: usize = 8;

/// Where clip durations came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationStrategy {
    /// Randomized walk around the even split.
    Random,
    /// Authored per-slide durations.
    Scenario,
}

/// Immutable timing and frame-size plan for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPlan {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Transition length, possibly shortened by the fade guard.
    pub fade_duration: f64,
    pub outro_duration: f64,
    /// Clip length per page, including the transition overlap.
    pub durations: Vec<f64>,
    /// Visible length of the assembled video.
    pub total_duration: f64,
    pub strategy: DurationStrategy,
}

/// Combined clip length needed for `total` seconds of video with `n`
/// overlapping transitions of `fade` seconds.
fn clip_budget(total: f64, fade: f64, n: usize) -> f64 {
    total + n.saturating_sub(1) as f64 * fade
}

fn variation<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random_range(-MAX_VARIATION..=MAX_VARIATION)
}

fn within_variation(ratio: f64) -> bool {
    (ratio - 1.0).abs() <= MAX_VARIATION + RATIO_EPSILON
}

/// Randomized clip lengths for `n` pages.
///
/// The first clip varies by up to ±15% from the even split and each later
/// clip by up to ±15% from its predecessor, floored at 1.1× the fade. The
/// whole sequence is then scaled so that `Σd − (n−1)·fade == total`. A draw
/// whose rescaled shape breaks the ±15% bounds is discarded; after
/// [`MAX_DRAWS`] failures every clip gets the even split.
pub fn random_durations<R: Rng + ?Sized>(total: f64, fade: f64, n: usize, rng: &mut R) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let budget = clip_budget(total, fade, n);
    let base = budget / n as f64;

    for _ in 0..MAX_DRAWS {
        let mut durations = Vec::with_capacity(n);
        durations.push(base * (1.0 + variation(rng)));
        for i in 1..n {
            let next = durations[i - 1] * (1.0 + variation(rng));
            durations.push(next.max(fade * FADE_FLOOR));
        }

        let sum: f64 = durations.iter().sum();
        if sum <= 0.0 {
            continue;
        }
        let scale = budget / sum;
        durations.iter_mut().for_each(|d| *d *= scale);

        let first_ok = within_variation(durations[0] / base);
        if first_ok && durations.windows(2).all(|w| within_variation(w[1] / w[0])) {
            return durations;
        }
    }

    debug!(pages = n, "No random shape within bounds, using even split");
    vec![base; n]
}

fn round_to_frame(duration: f64, fps: u32) -> f64 {
    let fps = fps as f64;
    (duration * fps).round().max(1.0) / fps
}

/// Clip lengths taken from scenario slides.
///
/// Pages without a slide (or with a non-positive duration) use `fallback`.
/// With a `target` total the lengths are scaled to fit it. Every length is
/// rounded to a whole frame so transitions land on frame boundaries.
pub fn scenario_durations(
    scenario: &Scenario,
    n: usize,
    fade: f64,
    fps: u32,
    target: Option<f64>,
    fallback: f64,
) -> Vec<f64> {
    let mut durations: Vec<f64> = (0..n)
        .map(|i| {
            scenario
                .slide(i)
                .map(|s| s.duration)
                .filter(|d| *d > 0.0)
                .unwrap_or(fallback)
        })
        .collect();

    if let Some(total) = target {
        let sum: f64 = durations.iter().sum();
        if sum > 0.0 {
            let scale = clip_budget(total, fade, n) / sum;
            info!(scale, "Scaling scenario durations to target length");
            durations.iter_mut().for_each(|d| *d *= scale);
        }
    }

    durations.iter().map(|d| round_to_frame(*d, fps)).collect()
}

/// Output width matching the source aspect ratio at `height`, kept even.
pub fn auto_aspect_width(height: u32, source: (u32, u32)) -> Option<u32> {
    let (sw, sh) = source;
    if sw == 0 || sh == 0 {
        return None;
    }
    let mut width = (height as f64 * (sw as f64 / sh as f64)) as u32;
    if width % 2 != 0 {
        width += 1;
    }
    (width > 0).then_some(width)
}

impl RenderPlan {
    /// Plan a run of `page_count` pages.
    ///
    /// `first_page` is the first page's native size, used for auto-aspect.
    /// A scenario with slides switches to authored durations.
    pub fn build<R: Rng + ?Sized>(
        config: &Config,
        page_count: usize,
        first_page: Option<(u32, u32)>,
        scenario: Option<&Scenario>,
        rng: &mut R,
    ) -> Result<Self> {
        if page_count == 0 {
            return Err(PagecastError::Config("source has no pages".into()));
        }

        let target = (config.total_duration > 0.0).then_some(config.total_duration);
        let scenario = scenario.filter(|s| !s.slides.is_empty());
        let strategy = if scenario.is_some() {
            DurationStrategy::Scenario
        } else {
            DurationStrategy::Random
        };

        let plan_durations = |fade: f64, rng: &mut R| match scenario {
            Some(s) => scenario_durations(s, page_count, fade, config.fps, target, config.page_duration),
            None => {
                let total = target.unwrap_or(config.page_duration * page_count as f64);
                random_durations(total, fade, page_count, rng)
            }
        };

        // Duration plan
        let mut fade = if page_count > 1 { config.fade_duration } else { 0.0 };
        let mut durations = plan_durations(fade, &mut *rng);

        enter(PipelineStage::FadeGuard);
        for _ in 0..MAX_FADE_PASSES {
            let shortest = durations.iter().copied().fold(f64::INFINITY, f64::min);
            if fade <= 0.0 || fade < shortest {
                break;
            }
            let shortened = shortest / 2.0;
            warn!(from = fade, to = shortened, "Transition shortened to fit the shortest clip");
            fade = shortened;
            durations = plan_durations(fade, &mut *rng);
        }

        enter(PipelineStage::AutoAspect);
        let (mut width, height) = config.frame_size();
        if config.auto_aspect && config.preset.is_none() {
            if let Some(w) = first_page.and_then(|dims| auto_aspect_width(height, dims)) {
                if w != width {
                    info!(from = width, to = w, height, "Matched output width to page aspect");
                }
                width = w;
            }
        }

        let total_duration = durations.iter().sum::<f64>() - (page_count - 1) as f64 * fade;

        info!(
            pages = page_count,
            width,
            height,
            fps = config.fps,
            fade,
            total = total_duration,
            strategy = ?strategy,
            "Render plan ready"
        );

        Ok(Self {
            width,
            height,
            fps: config.fps,
            fade_duration: fade,
            outro_duration: config.outro_duration,
            durations,
            total_duration,
            strategy,
        })
    }

    pub fn page_count(&self) -> usize {
        self.durations.len()
    }

    /// Encode parameters for one page, without a filter.
    ///
    /// `debug` is the set of overlays the encoder can actually draw.
    pub fn segment_params(&self, page_index: usize, config: &Config, debug: DebugOverlays) -> Option<SegmentParams> {
        let duration = *self.durations.get(page_index)?;
        Some(SegmentParams {
            width: self.width,
            height: self.height,
            fps: self.fps,
            duration,
            fade_duration: self.fade_duration,
            outro_duration: self.outro_duration,
            zoom_mode: config.zoom_mode,
            zoom_speed: config.zoom_speed,
            page_index,
            debug,
            filter: String::new(),
        })
    }
}
