//! Final assembly command construction.
//!
//! Pure argument building, kept apart from process handling so the filter
//! graphs can be checked without an ffmpeg binary.

use crate::encoder::VideoEncoder;
use pagecast_core::Transition;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Background fade-in/out length for long videos, in seconds.
const BG_FADE_SECS: f64 = 5.0;

/// Everything assembly needs beyond the segment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblySettings {
    pub transition: Transition,
    pub fade_duration: f64,
    /// Per-segment clip lengths, used for xfade offsets.
    pub durations: Vec<f64>,
    /// Visible length of the final video.
    pub total_duration: f64,
    /// Narration track, mapped as-is.
    pub audio: Option<PathBuf>,
    /// Looping music bed mixed under the narration.
    pub background_audio: Option<PathBuf>,
    pub background_volume: f64,
    pub encoder: VideoEncoder,
    pub quality: u32,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            transition: Transition::Fade,
            fade_duration: 0.5,
            durations: Vec::new(),
            total_duration: 0.0,
            audio: None,
            background_audio: None,
            background_volume: 0.3,
            encoder: VideoEncoder::Libx264,
            quality: 23,
        }
    }
}

impl AssemblySettings {
    pub fn has_audio(&self) -> bool {
        self.audio.is_some() || self.background_audio.is_some()
    }
}

/// An ffmpeg invocation plus the concat list it reads, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyCommand {
    pub args: Vec<String>,
    /// `(path, contents)` of the concat demuxer list to write first.
    pub concat_list: Option<(PathBuf, String)>,
}

fn path_arg(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

/// Quote a path for the concat demuxer list.
fn concat_entry(p: &Path) -> String {
    format!("file '{}'\n", path_arg(p).replace('\'', r"'\''"))
}

/// Volume envelope for the background track: rise from 10% over the
/// fade-in, hold, then fall to silence over the fade-out.
pub fn background_volume_expr(volume: f64, total: f64) -> String {
    let fade = if total < 2.0 * BG_FADE_SECS {
        total * 0.1
    } else {
        BG_FADE_SECS
    };
    format!(
        "volume='{volume:.6}*(if(lte(t,{fade:.6}),0.1+0.9*(t/{fade:.6}),if(gte(t,{:.6}),({total:.6}-t)/{fade:.6},1.0)))':eval=frame",
        total - fade
    )
}

/// Build the assembly command for `segments`.
///
/// - No transition and no audio: concat demuxer with stream copy.
/// - Transition: an `xfade` chain, offset by the accumulated clip lengths
///   minus one fade per join.
/// - No transition but audio present: the `concat` filter.
pub fn build_assembly(
    segments: &[PathBuf],
    output: &Path,
    work_dir: &Path,
    settings: &AssemblySettings,
) -> AssemblyCommand {
    let n = segments.len();
    let use_xfade = !settings.transition.is_none() && n > 1;

    if !use_xfade && !settings.has_audio() {
        let list_path = work_dir.join("inputs.txt");
        let contents: String = segments.iter().map(|p| concat_entry(p)).collect();
        let args = vec![
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            path_arg(&list_path),
            "-c".into(),
            "copy".into(),
            path_arg(output),
        ];
        return AssemblyCommand {
            args,
            concat_list: Some((list_path, contents)),
        };
    }

    let mut args: Vec<String> = vec!["-y".into()];
    for seg in segments {
        args.push("-i".into());
        args.push(path_arg(seg));
    }

    let mut next_input = n;
    let audio_index = settings.audio.as_ref().map(|p| {
        args.extend(["-i".into(), path_arg(p)]);
        next_input += 1;
        next_input - 1
    });
    let bg_index = settings.background_audio.as_ref().map(|p| {
        args.extend(["-stream_loop".into(), "-1".into(), "-i".into(), path_arg(p)]);
        next_input += 1;
        next_input - 1
    });

    let mut graph: Vec<String> = Vec::new();
    let mut video_out = "0:v".to_string();

    if use_xfade {
        let fade = settings.fade_duration;
        let fallback = settings.total_duration / n as f64;
        let mut last = "[0:v]".to_string();
        let mut offset = 0.0;
        for i in 1..n {
            let clip = settings.durations.get(i - 1).copied().unwrap_or(fallback);
            offset += clip - fade;
            let out = format!("[v{i}]");
            graph.push(format!(
                "{last}[{i}:v]xfade=transition={}:duration={fade:.6}:offset={offset:.6}{out}",
                settings.transition
            ));
            last = out;
        }
        video_out = last;
    } else if n > 1 {
        let mut inputs = String::new();
        for i in 0..n {
            let _ = write!(inputs, "[{i}:v]");
        }
        graph.push(format!("{inputs}concat=n={n}:v=1:a=0[vconcat]"));
        video_out = "[vconcat]".into();
    }

    let audio_out = match (audio_index, bg_index) {
        (Some(main), Some(bg)) => {
            let vol = background_volume_expr(settings.background_volume, settings.total_duration);
            graph.push(format!("[{bg}:a]{vol}[bg_a]"));
            graph.push(format!("[{main}:a]volume=1.0[main_a]"));
            graph.push("[main_a][bg_a]amix=inputs=2:duration=first:dropout_transition=3[aout]".into());
            Some("[aout]".to_string())
        }
        (Some(main), None) => Some(format!("{main}:a")),
        (None, Some(bg)) => {
            let vol = background_volume_expr(settings.background_volume, settings.total_duration);
            graph.push(format!("[{bg}:a]{vol}[aout]"));
            Some("[aout]".to_string())
        }
        (None, None) => None,
    };

    if !graph.is_empty() {
        args.push("-filter_complex".into());
        args.push(graph.join(";"));
    }

    args.extend(["-map".into(), video_out]);
    if let Some(audio) = audio_out {
        args.extend(["-map".into(), audio, "-shortest".into(), "-c:a".into(), "aac".into()]);
    }

    args.extend([
        "-c:v".into(),
        settings.encoder.ffmpeg_name().into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ]);
    args.extend(settings.encoder.quality_args(settings.quality));
    args.push(path_arg(output));

    AssemblyCommand {
        args,
        concat_list: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("/work/s{i}.mp4"))).collect()
    }

    fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_fast_path_uses_concat_list() {
        let settings = AssemblySettings {
            transition: Transition::None,
            ..Default::default()
        };
        let cmd = build_assembly(&segments(2), Path::new("/out.mp4"), Path::new("/work"), &settings);
        let (list, contents) = cmd.concat_list.unwrap();
        assert_eq!(list, PathBuf::from("/work/inputs.txt"));
        assert_eq!(contents, "file '/work/s0.mp4'\nfile '/work/s1.mp4'\n");
        assert_eq!(arg_after(&cmd.args, "-c"), Some("copy"));
        assert_eq!(cmd.args.last().unwrap(), "/out.mp4");
    }

    #[test]
    fn test_concat_list_escapes_quotes() {
        assert_eq!(concat_entry(Path::new("/a/it's.mp4")), "file '/a/it'\\''s.mp4'\n");
    }

    #[test]
    fn test_xfade_offsets_accumulate() {
        let settings = AssemblySettings {
            transition: Transition::Fade,
            fade_duration: 0.5,
            durations: vec![5.0, 4.0, 6.0],
            total_duration: 14.0,
            ..Default::default()
        };
        let cmd = build_assembly(&segments(3), Path::new("/out.mp4"), Path::new("/work"), &settings);
        assert!(cmd.concat_list.is_none());
        let graph = arg_after(&cmd.args, "-filter_complex").unwrap();
        assert_eq!(
            graph,
            "[0:v][1:v]xfade=transition=fade:duration=0.500000:offset=4.500000[v1];\
             [v1][2:v]xfade=transition=fade:duration=0.500000:offset=8.000000[v2]"
        );
        assert_eq!(arg_after(&cmd.args, "-map"), Some("[v2]"));
        assert!(!cmd.args.contains(&"-shortest".to_string()));
        assert_eq!(arg_after(&cmd.args, "-crf"), Some("23"));
    }

    #[test]
    fn test_audio_without_transition_uses_concat_filter() {
        let settings = AssemblySettings {
            transition: Transition::None,
            audio: Some("/voice.mp3".into()),
            ..Default::default()
        };
        let cmd = build_assembly(&segments(3), Path::new("/out.mp4"), Path::new("/work"), &settings);
        let graph = arg_after(&cmd.args, "-filter_complex").unwrap();
        assert_eq!(graph, "[0:v][1:v][2:v]concat=n=3:v=1:a=0[vconcat]");
        let maps: Vec<&str> = cmd
            .args
            .windows(2)
            .filter(|w| w[0] == "-map")
            .map(|w| w[1].as_str())
            .collect();
        assert_eq!(maps, vec!["[vconcat]", "3:a"]);
        assert!(cmd.args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn test_single_segment_with_audio_maps_input_directly() {
        let settings = AssemblySettings {
            audio: Some("/voice.mp3".into()),
            ..Default::default()
        };
        let cmd = build_assembly(&segments(1), Path::new("/out.mp4"), Path::new("/work"), &settings);
        assert!(arg_after(&cmd.args, "-filter_complex").is_none());
        assert_eq!(arg_after(&cmd.args, "-map"), Some("0:v"));
    }

    #[test]
    fn test_background_is_looped_and_mixed() {
        let settings = AssemblySettings {
            durations: vec![6.0, 6.0],
            total_duration: 11.5,
            audio: Some("/voice.mp3".into()),
            background_audio: Some("/music.mp3".into()),
            background_volume: 0.2,
            ..Default::default()
        };
        let cmd = build_assembly(&segments(2), Path::new("/out.mp4"), Path::new("/work"), &settings);
        let loop_pos = cmd.args.iter().position(|a| a == "-stream_loop").unwrap();
        assert_eq!(cmd.args[loop_pos + 3], "/music.mp3");

        let graph = arg_after(&cmd.args, "-filter_complex").unwrap();
        assert!(graph.contains("[3:a]volume='0.200000*(if(lte(t,5.000000)"));
        assert!(graph.contains("[2:a]volume=1.0[main_a]"));
        assert!(graph.ends_with("amix=inputs=2:duration=first:dropout_transition=3[aout]"));
    }

    #[test]
    fn test_background_alone_is_sole_track() {
        let settings = AssemblySettings {
            transition: Transition::None,
            total_duration: 8.0,
            background_audio: Some("/music.mp3".into()),
            ..Default::default()
        };
        let cmd = build_assembly(&segments(1), Path::new("/out.mp4"), Path::new("/work"), &settings);
        let graph = arg_after(&cmd.args, "-filter_complex").unwrap();
        assert!(graph.starts_with("[1:a]volume="));
        assert!(graph.ends_with("[aout]"));
    }

    #[test]
    fn test_short_video_background_fades_are_ten_percent() {
        let expr = background_volume_expr(1.0, 8.0);
        assert!(expr.contains("lte(t,0.800000)"));
        assert!(expr.contains("gte(t,7.200000)"));
    }
}
