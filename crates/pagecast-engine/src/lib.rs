//! Pagecast Engine - orchestration of a page-to-video run
//!
//! This crate provides:
//! - [`Config`] and its validation
//! - [`RenderPlan`], the immutable per-run timing and frame-size plan
//! - [`Pipeline`], the concurrent render/encode stages and final assembly
//! - Scenario generation from detected page regions
//! - [`RunReport`] timing summaries

pub mod config;
pub mod generate;
pub mod pipeline;
pub mod plan;
pub mod report;

pub use config::{AnalyzeMode, AspectPreset, Config};
pub use pipeline::{Pipeline, PipelineStage};
pub use plan::{random_durations, DurationStrategy, RenderPlan};
pub use report::RunReport;
