//! Pagecast Director - planning where the camera looks
//!
//! Turns detected blocks into a time-ordered keyframe path per page and
//! persists those paths as a versioned scenario file.

pub mod planner;
pub mod scenario;

pub use planner::{Director, DirectorConfig};
pub use scenario::{Keyframe, Scenario, ScenarioFormat, Slide, FULL_VIEW, SCENARIO_VERSION};
