//! Pagecast Motion - camera motion for still pages
//!
//! Two views of the same keyframe path:
//! - ffmpeg `zoompan` expressions evaluated per output frame
//! - a time-based interpolator returning a [`CameraState`]
//!
//! [`Effect`] implementations combine these into the full per-segment
//! filter chain.

pub mod effect;
pub mod interpolate;
pub mod zoompan;

pub use effect::{aspect_wrap, BreathingEffect, Effect, ScenarioEffect, SUPERSAMPLE};
pub use interpolate::{ease_in_out_cubic, interpolate, CameraState};
pub use zoompan::{debug_box_filter, zoompan_filter};
