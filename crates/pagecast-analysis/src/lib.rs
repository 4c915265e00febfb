//! Pagecast Analysis - finding regions worth zooming into
//!
//! All detection is local image math, no models:
//! - Grayscale conversion, Sobel edges, dilation
//! - Connected-component extraction into [`Block`]s
//! - A closed registry of detector variants

pub mod block;
pub mod contrast;
pub mod error;
pub mod gray;
pub mod registry;

pub use block::{Block, BlockKind};
pub use contrast::{ContrastConfig, ContrastDetector};
pub use error::{DetectError, DetectResult};
pub use registry::{create_detector, Detector, DetectorVariant};
