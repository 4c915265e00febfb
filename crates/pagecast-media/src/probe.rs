//! Media duration probing via `ffprobe`.

use pagecast_core::{PagecastError, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Container duration of a media file in seconds.
pub fn probe_duration(path: impl AsRef<Path>) -> Result<f64> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PagecastError::NotFound(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let ffprobe = which::which("ffprobe")
        .map_err(|e| PagecastError::ToolMissing(format!("ffprobe: {e}")))?;

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(PagecastError::Serialization(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let duration = parse_duration(&String::from_utf8_lossy(&output.stdout))?;
    debug!(path = %path.display(), duration, "Probed duration");
    Ok(duration)
}

fn parse_duration(text: &str) -> Result<f64> {
    let value = text.trim();
    value
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| PagecastError::Serialization(format!("unusable duration '{value}'")))
}
