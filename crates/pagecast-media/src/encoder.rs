//! Encoder abstraction and H.264 encoder selection.

use crate::assembly::AssemblySettings;
use pagecast_core::{CancelToken, FrameBuffer, PagecastError, Result, SegmentParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Turns pages into clips and clips into the final video.
pub trait MediaEncoder: Send + Sync {
    /// Encode one page into a clip at `output` using `params.filter`.
    ///
    /// Must return `Err(Cancelled)` promptly once `cancel` fires.
    fn encode_segment(
        &self,
        frame: &FrameBuffer,
        output: &Path,
        params: &SegmentParams,
        cancel: &CancelToken,
    ) -> Result<()>;

    /// Join `segments` (in order) into `output`.
    fn concatenate(
        &self,
        segments: &[PathBuf],
        output: &Path,
        work_dir: &Path,
        settings: &AssemblySettings,
        cancel: &CancelToken,
    ) -> Result<()>;

    /// Whether the backend understands a filter by name.
    fn supports_filter(&self, _name: &str) -> bool {
        true
    }
}

// ── Video encoder ───────────────────────────────────────────────

/// H.264 encoder backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoEncoder {
    #[default]
    #[serde(rename = "libx264")]
    Libx264,
    #[serde(rename = "h264_nvenc")]
    H264Nvenc,
    #[serde(rename = "h264_videotoolbox")]
    H264VideoToolbox,
}

impl VideoEncoder {
    /// Preference order for auto-detection.
    pub const PREFERENCE: [VideoEncoder; 3] = [Self::H264VideoToolbox, Self::H264Nvenc, Self::Libx264];

    /// FFmpeg encoder name.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            Self::Libx264 => "libx264",
            Self::H264Nvenc => "h264_nvenc",
            Self::H264VideoToolbox => "h264_videotoolbox",
        }
    }

    /// Rate-control arguments for a quality value.
    ///
    /// VideoToolbox takes a bitrate of `quality * 100` kbit/s, NVENC a
    /// constant-quality level, libx264 a CRF.
    pub fn quality_args(self, quality: u32) -> Vec<String> {
        match self {
            Self::H264VideoToolbox => vec!["-b:v".into(), format!("{}k", quality * 100)],
            Self::H264Nvenc => vec!["-cq".into(), quality.to_string()],
            Self::Libx264 => vec![
                "-crf".into(),
                quality.to_string(),
                "-preset".into(),
                "medium".into(),
            ],
        }
    }

    /// Pick the most preferred encoder present in `ffmpeg -encoders` output.
    pub fn pick_from_listing(listing: &str) -> Self {
        Self::PREFERENCE
            .into_iter()
            .find(|enc| {
                listing
                    .lines()
                    .any(|line| line.split_whitespace().nth(1) == Some(enc.ffmpeg_name()))
            })
            .unwrap_or(Self::Libx264)
    }
}

impl std::fmt::Display for VideoEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

impl std::str::FromStr for VideoEncoder {
    type Err = PagecastError;

    fn from_str(s: &str) -> Result<Self> {
        Self::PREFERENCE
            .into_iter()
            .find(|e| e.ffmpeg_name() == s)
            .ok_or_else(|| PagecastError::Config(format!("unknown video encoder '{s}'")))
    }
}

/// Query the local ffmpeg for the best available H.264 encoder.
///
/// Falls back to libx264 when ffmpeg cannot be queried.
pub fn detect_best_encoder() -> VideoEncoder {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let encoder = VideoEncoder::pick_from_listing(&String::from_utf8_lossy(&out.stdout));
            info!(encoder = %encoder, "Detected video encoder");
            encoder
        }
        Ok(out) => {
            debug!(status = %out.status, "ffmpeg -encoders failed, using libx264");
            VideoEncoder::Libx264
        }
        Err(e) => {
            debug!(error = %e, "ffmpeg not runnable, using libx264");
            VideoEncoder::Libx264
        }
    }
}
