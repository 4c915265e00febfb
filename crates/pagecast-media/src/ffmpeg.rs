//! `ffmpeg` subprocess encoder.
//!
//! Each segment is a single raw frame piped to ffmpeg's stdin; the `-vf`
//! chain (zoompan with `d=<frames>`) expands it into the full clip. The
//! child is polled so a fired [`CancelToken`] kills it mid-encode.

use crate::assembly::{build_assembly, AssemblySettings};
use crate::encoder::{MediaEncoder, VideoEncoder};
use pagecast_core::{CancelToken, FrameBuffer, PagecastError, Result, SegmentParams};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Stdin write size between cancellation checks.
const WRITE_CHUNK: usize = 1 << 20;

/// Interval between child status polls.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Outcome of a failed ffmpeg run.
#[derive(Debug)]
enum RunError {
    Cancelled,
    Failed {
        message: String,
        stderr: Option<String>,
    },
}

impl RunError {
    fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            stderr: None,
        }
    }
}

/// [`MediaEncoder`] backed by the `ffmpeg` binary on `PATH`.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
    encoder: VideoEncoder,
    quality: u32,
}

impl FfmpegEncoder {
    /// Locate ffmpeg. Fails with `ToolMissing` when it is not installed.
    pub fn new(encoder: VideoEncoder, quality: u32) -> Result<Self> {
        let binary = which::which("ffmpeg")
            .map_err(|e| PagecastError::ToolMissing(format!("ffmpeg: {e}")))?;
        info!(binary = %binary.display(), encoder = %encoder, quality, "Using ffmpeg");
        Ok(Self {
            binary,
            encoder,
            quality,
        })
    }

    pub fn encoder(&self) -> VideoEncoder {
        self.encoder
    }

    /// Arguments for encoding one page into a clip.
    pub fn segment_args(&self, frame: &FrameBuffer, output: &Path, params: &SegmentParams) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pixel_format".into(),
            frame.format.ffmpeg_name().into(),
            "-video_size".into(),
            format!("{}x{}", frame.width, frame.height),
            "-i".into(),
            "-".into(),
        ];
        if !params.filter.is_empty() {
            args.extend(["-vf".into(), params.filter.clone()]);
        }
        args.extend([
            "-t".into(),
            format!("{:.6}", params.duration),
            "-r".into(),
            params.fps.to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-c:v".into(),
            self.encoder.ffmpeg_name().into(),
        ]);
        args.extend(self.encoder.quality_args(self.quality));
        args.push(output.to_string_lossy().into_owned());
        args
    }

    /// Run ffmpeg to completion, feeding `input` to stdin.
    fn run(&self, args: &[String], input: Option<&[u8]>, cancel: &CancelToken) -> std::result::Result<(), RunError> {
        let mut child = Command::new(&self.binary)
            .args(["-hide_banner", "-loglevel", "error"])
            .args(args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RunError::failed(format!("Failed to spawn ffmpeg: {e}")))?;

        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });
        let collect_stderr = |reader: Option<thread::JoinHandle<String>>| {
            reader
                .and_then(|h| h.join().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        if let (Some(data), Some(mut stdin)) = (input, child.stdin.take()) {
            for chunk in data.chunks(WRITE_CHUNK) {
                if cancel.is_cancelled() {
                    break;
                }
                if let Err(e) = stdin.write_all(chunk) {
                    // ffmpeg exited early; its status and stderr explain why
                    debug!(error = %e, "ffmpeg closed stdin");
                    break;
                }
            }
            // Close stdin to signal end-of-stream
            drop(stdin);
        }

        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                let _ = collect_stderr(stderr_reader);
                return Err(RunError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(RunError::failed(format!("Failed to wait for ffmpeg: {e}")));
                }
            }
        };

        let stderr = collect_stderr(stderr_reader);
        if status.success() {
            Ok(())
        } else {
            Err(RunError::Failed {
                message: format!("ffmpeg exited with {status}"),
                stderr,
            })
        }
    }
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove partial output");
        }
    }
}

impl MediaEncoder for FfmpegEncoder {
    fn encode_segment(
        &self,
        frame: &FrameBuffer,
        output: &Path,
        params: &SegmentParams,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        let args = self.segment_args(frame, output, params);
        debug!(page = params.page_index, output = %output.display(), "Encoding segment");

        match self.run(&args, Some(&frame.data), cancel) {
            Ok(()) => Ok(()),
            Err(RunError::Cancelled) => {
                remove_partial(output);
                Err(PagecastError::Cancelled)
            }
            Err(RunError::Failed { message, stderr }) => Err(PagecastError::Encode {
                page: params.page_index,
                message,
                stderr,
            }),
        }
    }

    fn concatenate(
        &self,
        segments: &[PathBuf],
        output: &Path,
        work_dir: &Path,
        settings: &AssemblySettings,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        let command = build_assembly(segments, output, work_dir, settings);
        if let Some((path, contents)) = &command.concat_list {
            std::fs::write(path, contents)?;
        }
        info!(
            segments = segments.len(),
            transition = %settings.transition,
            output = %output.display(),
            "Assembling final video"
        );

        match self.run(&command.args, None, cancel) {
            Ok(()) => Ok(()),
            Err(RunError::Cancelled) => {
                remove_partial(output);
                Err(PagecastError::Cancelled)
            }
            Err(RunError::Failed { message, stderr }) => {
                remove_partial(output);
                Err(PagecastError::Assembly { message, stderr })
            }
        }
    }

    fn supports_filter(&self, name: &str) -> bool {
        Command::new(&self.binary)
            .args(["-hide_banner", "-h", &format!("filter={name}")])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map(|out| {
                let text = String::from_utf8_lossy(&out.stdout);
                out.status.success() && !text.contains("Unknown filter")
            })
            .unwrap_or(false)
    }
}
