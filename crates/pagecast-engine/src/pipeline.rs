//! Two-stage render/encode pipeline.
//!
//! ```text
//! jobs ─▶ render workers ─▶ rendered ─▶ encode workers ─▶ slots[i]
//! ```
//!
//! Both hand-offs are bounded channels sized to the page count, so sends
//! never block. Each page index is written to its own `OnceLock` slot, which
//! is the only state the stages share. Per-page failures are logged and
//! leave the slot empty; the gap is reported once both stages drain.

use crate::config::Config;
use crate::plan::RenderPlan;
use crate::report::RunReport;
use crossbeam_channel::bounded;
use pagecast_core::{CancelToken, DebugOverlays, PagecastError, PooledFrame, Result};
use pagecast_director::Scenario;
use pagecast_media::{FrameSource, MediaEncoder};
use pagecast_motion::{BreathingEffect, Effect, ScenarioEffect};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Pipeline stages, logged as the run advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Init,
    DurationPlan,
    ScenarioLoad,
    FadeGuard,
    AutoAspect,
    RenderEncode,
    Finalize,
    Complete,
}

impl PipelineStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Init => "Validating configuration",
            Self::DurationPlan => "Planning clip durations",
            Self::ScenarioLoad => "Loading scenario",
            Self::FadeGuard => "Checking transition length",
            Self::AutoAspect => "Fitting output aspect",
            Self::RenderEncode => "Rendering and encoding pages",
            Self::Finalize => "Assembling final video",
            Self::Complete => "Done",
        }
    }
}

pub(crate) fn enter(stage: PipelineStage) {
    info!(stage = ?stage, "{}", stage.display_name());
}

/// Drives a run against a frame source and a media encoder.
pub struct Pipeline {
    source: Arc<dyn FrameSource>,
    encoder: Arc<dyn MediaEncoder>,
    cancel: CancelToken,
}

impl Pipeline {
    pub fn new(source: Arc<dyn FrameSource>, encoder: Arc<dyn MediaEncoder>, cancel: CancelToken) -> Self {
        Self {
            source,
            encoder,
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub(crate) fn source(&self) -> &dyn FrameSource {
        self.source.as_ref()
    }

    pub(crate) fn rng(config: &Config) -> StdRng {
        match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    pub(crate) fn first_page_dims(&self) -> Option<(u32, u32)> {
        match self.source.page_dimensions(0) {
            Ok(dims) => Some(dims),
            Err(e) => {
                warn!(error = %e, "Could not read first page size");
                None
            }
        }
    }

    /// Release the source. Called once per run, whatever the outcome.
    pub(crate) fn close_source(&self) {
        match self.source.close() {
            Ok(()) => debug!("Source closed"),
            Err(e) => warn!(error = %e, "Failed to close source"),
        }
    }

    /// Overlays to burn in, limited to the filters the encoder has.
    pub(crate) fn debug_overlays(&self, config: &Config) -> DebugOverlays {
        if !config.debug {
            return DebugOverlays::OFF;
        }
        let overlays = DebugOverlays {
            label: self.encoder.supports_filter("drawtext"),
            boxes: self.encoder.supports_filter("drawbox"),
        };
        if !overlays.label {
            warn!("Encoder has no drawtext filter, skipping debug labels");
        }
        if !overlays.boxes {
            warn!("Encoder has no drawbox filter, skipping debug boxes");
        }
        overlays
    }

    /// Validate, plan, render and encode every page, then assemble.
    pub fn run(&self, config: &Config) -> Result<RunReport> {
        let result = self.render_video(config);
        self.close_source();
        result
    }

    fn render_video(&self, config: &Config) -> Result<RunReport> {
        let started = Instant::now();

        enter(PipelineStage::Init);
        config.validate()?;
        let page_count = self.source.page_count();
        if page_count == 0 {
            return Err(PagecastError::Config("source has no pages".into()));
        }
        let work_dir = tempfile::Builder::new().prefix("pagecast_").tempdir()?;
        debug!(work_dir = %work_dir.path().display(), "Created work dir");

        let scenario = match &config.scenario_input {
            Some(path) => {
                enter(PipelineStage::ScenarioLoad);
                let scenario = Scenario::load_from_file(path)?;
                info!(path = %path.display(), slides = scenario.slides.len(), "Loaded scenario");
                Some(Arc::new(scenario))
            }
            None => None,
        };

        enter(PipelineStage::DurationPlan);
        let mut rng = Self::rng(config);
        let plan = RenderPlan::build(
            config,
            page_count,
            self.first_page_dims(),
            scenario.as_deref(),
            &mut rng,
        )?;

        let effect: Box<dyn Effect> = match scenario {
            Some(s) => Box::new(ScenarioEffect::new(s)),
            None => Box::new(match config.seed {
                Some(seed) => BreathingEffect::with_seed(seed),
                None => BreathingEffect::new(),
            }),
        };

        let overlays = self.debug_overlays(config);

        enter(PipelineStage::RenderEncode);
        let (slots, render_time, encode_time) =
            self.render_and_encode(config, &plan, effect.as_ref(), overlays, work_dir.path(), started);

        if self.cancel.is_cancelled() {
            warn!("Run cancelled before assembly");
            return Err(PagecastError::Cancelled);
        }

        let mut segments = Vec::with_capacity(page_count);
        for (page, slot) in slots.into_iter().enumerate() {
            match slot.into_inner() {
                Some(path) => segments.push(path),
                None => return Err(PagecastError::MissingSegment { page }),
            }
        }

        enter(PipelineStage::Finalize);
        let concat_started = Instant::now();
        if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let settings = config.assembly_settings(&plan.durations, plan.fade_duration, plan.total_duration);
        match self
            .encoder
            .concatenate(&segments, &config.output, work_dir.path(), &settings, &self.cancel)
        {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {
                remove_partial(&config.output);
                return Err(PagecastError::Cancelled);
            }
            Err(e) => return Err(e),
        }
        let concat_time = concat_started.elapsed();

        enter(PipelineStage::Complete);
        let report = RunReport {
            output: config.output.clone(),
            pages: page_count,
            width: plan.width,
            height: plan.height,
            video_duration: plan.total_duration,
            render_time,
            encode_time,
            concat_time,
            total_time: started.elapsed(),
        };
        report.log();
        Ok(report)
    }

    /// Run both worker stages to completion. Returns the filled slots and the
    /// time at which each stage's last worker finished.
    fn render_and_encode(
        &self,
        config: &Config,
        plan: &RenderPlan,
        effect: &dyn Effect,
        overlays: DebugOverlays,
        work_dir: &Path,
        started: Instant,
    ) -> (Vec<OnceLock<PathBuf>>, Duration, Duration) {
        let page_count = plan.page_count();
        let slots: Vec<OnceLock<PathBuf>> = (0..page_count).map(|_| OnceLock::new()).collect();

        let (job_tx, job_rx) = bounded::<usize>(page_count);
        let (frame_tx, frame_rx) = bounded::<(usize, PooledFrame)>(page_count);
        for page in 0..page_count {
            // Capacity equals the page count, so this never blocks or fails.
            let _ = job_tx.send(page);
        }
        drop(job_tx);

        let render_workers = config.workers.min(page_count).max(1);
        let encode_workers = config.encode_workers.min(page_count).max(1);
        info!(render_workers, encode_workers, pages = page_count, "Starting workers");

        let mut render_time = Duration::ZERO;
        let mut encode_time = Duration::ZERO;

        thread::scope(|scope| {
            let renderers: Vec<_> = (0..render_workers)
                .map(|_| {
                    let jobs = job_rx.clone();
                    let rendered = frame_tx.clone();
                    scope.spawn(move || {
                        for page in jobs.iter() {
                            if self.cancel.is_cancelled() {
                                break;
                            }
                            match self.source.render_page(page, config.dpi) {
                                Ok(frame) => {
                                    if rendered.send((page, frame)).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => warn!(page, error = %e, "Render failed"),
                            }
                        }
                    })
                })
                .collect();
            drop(frame_tx);

            let encoders: Vec<_> = (0..encode_workers)
                .map(|_| {
                    let rendered = frame_rx.clone();
                    let slots = &slots;
                    scope.spawn(move || {
                        for (page, frame) in rendered.iter() {
                            if self.cancel.is_cancelled() {
                                break;
                            }
                            let Some(params) = plan.segment_params(page, config, overlays) else {
                                warn!(page, "No plan entry for page");
                                continue;
                            };
                            let filter = effect.filter(&params);
                            let params = params.with_filter(filter);
                            let path = work_dir.join(format!("s{page}.mp4"));

                            match self.encoder.encode_segment(&frame, &path, &params, &self.cancel) {
                                Ok(()) => {
                                    store_segment(slots, page, path);
                                }
                                Err(e) if e.is_cancelled() => break,
                                Err(e) => warn!(page, error = %e, "Encode failed"),
                            }
                        }
                    })
                })
                .collect();

            for handle in renderers {
                if handle.join().is_err() {
                    error!("Render worker panicked");
                }
            }
            render_time = started.elapsed();

            for handle in encoders {
                if handle.join().is_err() {
                    error!("Encode worker panicked");
                }
            }
            encode_time = started.elapsed();
        });

        let ready = slots.iter().filter(|s| s.get().is_some()).count();
        info!(ready, pages = page_count, "Workers drained");
        (slots, render_time, encode_time)
    }
}

/// Record a finished segment. A page that already has one keeps it.
fn store_segment(slots: &[OnceLock<PathBuf>], page: usize, path: PathBuf) -> bool {
    match slots[page].set(path) {
        Ok(()) => {
            debug!(page, "Segment ready");
            true
        }
        Err(path) => {
            warn!(page, path = %path.display(), "Segment already set");
            false
        }
    }
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove partial output");
        }
    }
}
