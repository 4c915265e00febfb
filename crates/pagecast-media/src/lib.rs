//! Pagecast Media - page sources and FFmpeg I/O
//!
//! This crate handles:
//! - The [`FrameSource`] and [`MediaEncoder`] collaborator traits
//! - Raster image page sources
//! - Segment encoding and final assembly through an `ffmpeg` subprocess
//! - Duration probing and encoder detection

pub mod assembly;
pub mod encoder;
pub mod ffmpeg;
pub mod probe;
pub mod source;

pub use assembly::{build_assembly, AssemblyCommand, AssemblySettings};
pub use encoder::{detect_best_encoder, MediaEncoder, VideoEncoder};
pub use ffmpeg::FfmpegEncoder;
pub use probe::probe_duration;
pub use source::{FrameSource, ImageSource};
