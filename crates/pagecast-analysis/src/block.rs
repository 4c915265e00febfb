//! Detected regions.

use pagecast_core::Rect;
use serde::{Deserialize, Serialize};

/// Coarse classification of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    #[default]
    Unknown,
}

/// A rectangular region of interest on a page, in page pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub rect: Rect,
    pub kind: BlockKind,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

impl Block {
    pub fn new(rect: Rect, confidence: f32) -> Self {
        Self {
            rect,
            kind: BlockKind::Unknown,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}
