//! Scenario generation: detect regions on every page and plan a camera path.

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::plan::RenderPlan;
use pagecast_analysis::Detector;
use pagecast_core::{PagecastError, Result};
use pagecast_director::{Director, Scenario, Slide};
use rayon::prelude::*;
use tracing::{info, warn};

fn slide_label(page: usize) -> String {
    format!("slide_{}.png", page + 1)
}

impl Pipeline {
    /// Analyze every page and write the resulting scenario.
    ///
    /// Pages are analyzed in parallel. A page that fails to render, fails
    /// detection, or has no regions gets a single full-view keyframe.
    pub fn generate_scenario(&self, config: &Config) -> Result<Scenario> {
        let result = self.analyze_pages(config);
        self.close_source();
        result
    }

    fn analyze_pages(&self, config: &Config) -> Result<Scenario> {
        config.validate()?;
        let page_count = self.source().page_count();
        if page_count == 0 {
            return Err(PagecastError::Config("source has no pages".into()));
        }

        let mut rng = Self::rng(config);
        let plan = RenderPlan::build(config, page_count, self.first_page_dims(), None, &mut rng)?;
        let detector = config
            .analyze_mode
            .variant()
            .build(&config.contrast_config())?;

        info!(
            pages = page_count,
            detector = detector.name(),
            "Generating scenario"
        );

        let slides: Vec<Slide> = (0..page_count)
            .into_par_iter()
            .map(|page| self.plan_page(page, config, &plan, detector.as_ref()))
            .collect();

        self.cancel_token().check()?;

        let scenario = Scenario::new(slides);
        let path = config.scenario_output_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        scenario.save_to_file(&path)?;
        info!(path = %path.display(), slides = scenario.slides.len(), "Scenario written");
        Ok(scenario)
    }

    fn plan_page(&self, page: usize, config: &Config, plan: &RenderPlan, detector: &dyn Detector) -> Slide {
        let id = page as u32 + 1;
        let label = slide_label(page);
        let duration = plan.durations[page];
        let fallback = || Slide::static_view(id, slide_label(page), duration, plan.width, plan.height);

        if self.cancel_token().is_cancelled() {
            return fallback();
        }

        let frame = match self.source().render_page(page, config.dpi) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(page, error = %e, "Render failed, using full view");
                return fallback();
            }
        };

        let blocks = match detector.detect(&frame) {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!(page, error = %e, "Detection failed, using full view");
                return fallback();
            }
        };

        let director = Director::new(plan.width, plan.height).with_page_size(frame.width, frame.height);
        match director.plan_slide(id, &blocks, &label, duration, plan.fade_duration, plan.outro_duration) {
            Ok(slide) => slide,
            Err(e) => {
                warn!(page, error = %e, "No plan for page, using full view");
                fallback()
            }
        }
    }
}
