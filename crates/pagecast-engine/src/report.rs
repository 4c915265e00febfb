//! Run timing summary.

use pagecast_core::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;

/// Timings and shape of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub output: PathBuf,
    pub pages: usize,
    pub width: u32,
    pub height: u32,
    /// Length of the produced video in seconds.
    pub video_duration: f64,
    /// Until the last render worker finished.
    pub render_time: Duration,
    /// Until the last encode worker finished (overlaps rendering).
    pub encode_time: Duration,
    pub concat_time: Duration,
    pub total_time: Duration,
}

impl RunReport {
    /// Pages processed per wall-clock second.
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs > 0.0 {
            self.pages as f64 / secs
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        info!(
            output = %self.output.display(),
            pages = self.pages,
            video_secs = self.video_duration,
            render_secs = self.render_time.as_secs_f64(),
            encode_secs = self.encode_time.as_secs_f64(),
            concat_secs = self.concat_time.as_secs_f64(),
            total_secs = self.total_time.as_secs_f64(),
            pages_per_sec = self.pages_per_second(),
            "Run complete"
        );
    }

    /// Human-readable multi-line summary.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {} ({}x{}, {:.2}s video)\n\
             Total time: {:.2}s\n\
             Rendering: {:.2}s\n\
             Encoding: {:.2}s\n\
             Concatenation: {:.2}s\n\
             Pages/sec: {:.2}",
            self.pages,
            self.width,
            self.height,
            self.video_duration,
            self.total_time.as_secs_f64(),
            self.render_time.as_secs_f64(),
            self.encode_time.as_secs_f64(),
            self.concat_time.as_secs_f64(),
            self.pages_per_second()
        )
    }

    /// One benchmark log line, stamped with seconds since the Unix epoch.
    pub fn benchmark_line(&self, version: &str, input: &Path, timestamp: u64) -> String {
        let input = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        format!(
            "[{timestamp}] Build: {version} | Input: {input} | Pages: {} | Total: {:.2}s | Render: {:.2}s | Encode: {:.2}s | Concat: {:.2}s | Pages/s: {:.2}",
            self.pages,
            self.total_time.as_secs_f64(),
            self.render_time.as_secs_f64(),
            self.encode_time.as_secs_f64(),
            self.concat_time.as_secs_f64(),
            self.pages_per_second()
        )
    }

    /// Append a benchmark line to `log_path`, creating it if needed.
    pub fn append_benchmark(&self, log_path: &Path, version: &str, input: &Path) -> Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        writeln!(file, "{}", self.benchmark_line(version, input, timestamp))?;
        Ok(())
    }
}
