//! Edge-density region detection.
//!
//! Finds areas of a page with strong local contrast (text blocks, figures,
//! tables) by merging Sobel edges into blobs and boxing each blob. Works
//! without any model.

use crate::block::Block;
use crate::error::{DetectError, DetectResult};
use crate::gray::{connected_components, dilate, sobel_edges, GrayImage};
use crate::registry::Detector;
use pagecast_core::FrameBuffer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Confidence assigned to every contrast-detected block.
pub const CONTRAST_CONFIDENCE: f32 = 0.7;

/// Configuration for contrast detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContrastConfig {
    /// Minimum bounding-box area in px² (default: 500).
    pub min_block_area: i64,
    /// Sobel magnitude threshold in 0..255 luma units (default: 30).
    pub edge_threshold: f32,
    /// Dilation window size (default: 5).
    pub kernel_size: u32,
    /// Dilation passes (default: 2).
    pub iterations: u32,
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self {
            min_block_area: 500,
            edge_threshold: 30.0,
            kernel_size: 5,
            iterations: 2,
        }
    }
}

/// Detects blocks of dense edges.
#[derive(Debug, Clone, Default)]
pub struct ContrastDetector {
    pub config: ContrastConfig,
}

impl ContrastDetector {
    pub fn new(config: ContrastConfig) -> Self {
        Self { config }
    }
}

impl Detector for ContrastDetector {
    fn name(&self) -> &'static str {
        "contrast"
    }

    fn detect(&self, frame: &FrameBuffer) -> DetectResult<Vec<Block>> {
        let expected = frame.format.frame_size(frame.width, frame.height);
        if frame.data.len() != expected {
            return Err(DetectError::MalformedFrame {
                expected,
                actual: frame.data.len(),
            });
        }
        if frame.width == 0 || frame.height == 0 {
            return Ok(Vec::new());
        }

        let gray = GrayImage::from_frame(frame);
        let edges = sobel_edges(&gray, self.config.edge_threshold);
        let merged = dilate(&edges, self.config.kernel_size, self.config.iterations);
        let candidates = connected_components(&merged);
        let candidate_count = candidates.len();

        let blocks: Vec<Block> = candidates
            .into_iter()
            .filter(|r| r.area() >= self.config.min_block_area)
            .map(|r| Block::new(r, CONTRAST_CONFIDENCE))
            .collect();

        debug!(
            width = frame.width,
            height = frame.height,
            candidates = candidate_count,
            blocks = blocks.len(),
            "Contrast detection complete"
        );
        Ok(blocks)
    }
}
