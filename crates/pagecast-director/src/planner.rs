//! Turning detected blocks into a camera path.
//!
//! The path visits blocks in reading order (rows top to bottom, left to
//! right within a row), spends an even share of the clip on each, then
//! holds and pulls back to the full page before the transition starts.

use crate::scenario::{Keyframe, Scenario, Slide};
use pagecast_analysis::Block;
use pagecast_core::{PagecastError, Rect, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tunables for path planning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Shortest time spent on one block (default: 1.0 s).
    pub min_dwell: f64,
    /// Longest time spent on one block (default: 3.0 s).
    pub max_dwell: f64,
    /// Full-view lead-in before the first block (default: 1.0 s).
    pub intro: f64,
    /// Blocks whose top edges differ by at most this many pixels share a row (default: 20).
    pub row_tolerance: i32,
    /// Fraction of the viewport a zoomed block may fill (default: 0.9).
    pub fit_margin: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            min_dwell: 1.0,
            max_dwell: 3.0,
            intro: 1.0,
            row_tolerance: 20,
            fit_margin: 0.9,
            min_zoom: 1.0,
            max_zoom: 3.0,
        }
    }
}

/// Plans keyframe paths for pages.
#[derive(Debug, Clone, Default)]
pub struct Director {
    config: DirectorConfig,
    /// Pixel size of the page the blocks were detected on. When set, blocks
    /// are letterboxed into the viewport before planning.
    page_size: Option<(u32, u32)>,
}

impl Director {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self::with_config(DirectorConfig {
            viewport_width,
            viewport_height,
            ..Default::default()
        })
    }

    pub fn with_config(config: DirectorConfig) -> Self {
        Self {
            config,
            page_size: None,
        }
    }

    /// Declare that incoming blocks are in `width`×`height` page pixels.
    pub fn with_page_size(mut self, width: u32, height: u32) -> Self {
        self.page_size = Some((width, height));
        self
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    fn viewport(&self) -> (u32, u32) {
        (self.config.viewport_width, self.config.viewport_height)
    }

    /// Single-slide scenario for one page.
    pub fn generate_scenario(
        &self,
        blocks: &[Block],
        source_label: &str,
        total_duration: f64,
        fade_duration: f64,
        outro_duration: f64,
    ) -> Result<Scenario> {
        let slide = self.plan_slide(1, blocks, source_label, total_duration, fade_duration, outro_duration)?;
        Ok(Scenario::new(vec![slide]))
    }

    /// Keyframe path for one page. Fails when there is nothing to visit.
    pub fn plan_slide(
        &self,
        id: u32,
        blocks: &[Block],
        source_label: &str,
        total_duration: f64,
        fade_duration: f64,
        outro_duration: f64,
    ) -> Result<Slide> {
        if blocks.is_empty() {
            return Err(PagecastError::Detection(format!(
                "no regions to plan for {source_label}"
            )));
        }
        if total_duration.is_nan() || total_duration <= 0.0 || fade_duration < 0.0 || outro_duration < 0.0 {
            return Err(PagecastError::Config(format!(
                "invalid slide timing: total={total_duration} fade={fade_duration} outro={outro_duration}"
            )));
        }

        let ordered = self.reading_order(blocks);
        let dwell = self.dwell_time(ordered.len(), total_duration, fade_duration, outro_duration);
        let keyframes = self.keyframes(&ordered, dwell, total_duration, fade_duration, outro_duration);

        debug!(
            source = source_label,
            blocks = ordered.len(),
            dwell,
            keyframes = keyframes.len(),
            "Planned slide"
        );

        Ok(Slide {
            id,
            input: source_label.to_string(),
            duration: total_duration,
            keyframes,
        })
    }

    /// Rows top to bottom, then left to right within a row.
    ///
    /// A block joins the current row when its top edge is at most
    /// `row_tolerance` pixels below the row's first block (inclusive).
    /// Anchoring on the row's first block keeps the grouping transitive.
    pub fn reading_order(&self, blocks: &[Block]) -> Vec<Block> {
        let mut by_top = blocks.to_vec();
        by_top.sort_by_key(|b| (b.rect.y, b.rect.x));

        let mut rows: Vec<Vec<Block>> = Vec::new();
        for block in by_top {
            match rows.last_mut() {
                Some(row) if block.rect.y - row[0].rect.y <= self.config.row_tolerance => row.push(block),
                _ => rows.push(vec![block]),
            }
        }

        rows.into_iter()
            .flat_map(|mut row| {
                row.sort_by_key(|b| (b.rect.x, b.rect.y));
                row
            })
            .collect()
    }

    /// Seconds spent on each of `block_count` blocks.
    pub fn dwell_time(&self, block_count: usize, total: f64, fade: f64, outro: f64) -> f64 {
        if block_count == 0 {
            return self.config.min_dwell;
        }
        let reserved = self.config.intro + outro + fade;
        let mut available = total - reserved;
        if available <= 0.0 {
            available = total;
        }
        (available / block_count as f64).clamp(self.config.min_dwell, self.config.max_dwell)
    }

    /// Zoom that fits `rect` (viewport pixels) inside the viewport margin.
    pub fn zoom_for(&self, rect: Rect) -> f64 {
        if rect.is_degenerate() {
            return 1.0;
        }
        let fit_w = self.config.viewport_width as f64 * self.config.fit_margin / rect.w as f64;
        let fit_h = self.config.viewport_height as f64 * self.config.fit_margin / rect.h as f64;
        fit_w.min(fit_h).clamp(self.config.min_zoom, self.config.max_zoom)
    }

    fn to_viewport(&self, rect: Rect) -> Rect {
        match self.page_size {
            Some(page) => rect.letterbox(page, self.viewport()),
            None => rect,
        }
    }

    fn keyframes(&self, ordered: &[Block], dwell: f64, total: f64, fade: f64, outro: f64) -> Vec<Keyframe> {
        let (w, h) = self.viewport();
        // Nothing may be scheduled after the transition starts.
        let transition_start = (total - fade).max(0.0);
        let at = |t: f64| t.min(transition_start);

        let mut keyframes = Vec::with_capacity(ordered.len() + 4);
        keyframes.push(Keyframe::full_view(0.0, w, h));

        let mut cursor = self.config.intro;
        let mut last_pose = None;
        for (i, block) in ordered.iter().enumerate() {
            let rect = self.to_viewport(block.rect);
            let zoom = self.zoom_for(rect);
            keyframes.push(Keyframe::new(at(cursor), format!("region_{}", i + 1), rect, zoom));
            last_pose = Some((rect, zoom));
            cursor += dwell;
        }

        if let Some((rect, zoom)) = last_pose {
            let hold = cursor.max(total - fade - outro);
            keyframes.push(Keyframe::new(at(hold), "outro_stable", rect, zoom));
        }

        keyframes.push(Keyframe::full_view(transition_start, w, h));
        keyframes.push(Keyframe::full_view(total, w, h));
        keyframes
    }
}
