//! Detector selection by name.

use crate::block::Block;
use crate::contrast::{ContrastConfig, ContrastDetector};
use crate::error::{DetectError, DetectResult};
use pagecast_core::FrameBuffer;
use std::fmt;
use std::str::FromStr;

/// Finds regions of interest on a rasterized page.
///
/// Returned blocks are in page pixel coordinates, in no particular order.
pub trait Detector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn detect(&self, frame: &FrameBuffer) -> DetectResult<Vec<Block>>;
}

/// Every detector variant the tool knows about, built or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DetectorVariant {
    #[default]
    Contrast,
    Ocr,
    Ai,
}

impl DetectorVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contrast => "contrast",
            Self::Ocr => "ocr",
            Self::Ai => "ai",
        }
    }

    /// Instantiate the detector, or `NotImplemented` for variants without one.
    pub fn build(self, config: &ContrastConfig) -> DetectResult<Box<dyn Detector>> {
        match self {
            Self::Contrast => Ok(Box::new(ContrastDetector::new(config.clone()))),
            Self::Ocr | Self::Ai => Err(DetectError::NotImplemented {
                variant: self.as_str(),
            }),
        }
    }
}

impl fmt::Display for DetectorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorVariant {
    type Err = DetectError;

    /// An empty name selects the default contrast detector.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "contrast" => Ok(Self::Contrast),
            "ocr" => Ok(Self::Ocr),
            "ai" => Ok(Self::Ai),
            other => Err(DetectError::UnknownVariant {
                name: other.to_string(),
            }),
        }
    }
}

/// Parse `name` and build the matching detector.
pub fn create_detector(name: &str, config: &ContrastConfig) -> DetectResult<Box<dyn Detector>> {
    name.parse::<DetectorVariant>()?.build(config)
}
