//! Pagecast - slide decks to narrated pan-and-zoom video
//!
//! Entry point: parse flags, wire Ctrl-C to cancellation, run the pipeline.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Args;
use pagecast_core::{memory_budget, CancelToken, FramePool};
use pagecast_engine::{Config, Pipeline};
use pagecast_media::{probe_duration, FfmpegEncoder, ImageSource};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const BENCHMARK_LOG: &str = "benchmark.log";

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Pagecast {} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    args.apply(&mut config)?;
    if config.input.as_os_str().is_empty() {
        bail!("no input given (pass a page image or directory)");
    }
    sync_to_narration(&mut config);

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, cancelling");
        on_interrupt.cancel();
    })
    .context("installing Ctrl-C handler")?;

    let source = ImageSource::open(&config.input, FramePool::new(memory_budget::FRAME_POOL_SIZE))?;
    let encoder = FfmpegEncoder::new(config.encoder, config.quality)?;
    let pipeline = Pipeline::new(Arc::new(source), Arc::new(encoder), cancel);

    if config.generate_scenario {
        let scenario = pipeline.generate_scenario(&config)?;
        println!(
            "Scenario with {} slides written to {}",
            scenario.slides.len(),
            config.scenario_output_path().display()
        );
        return Ok(());
    }

    let report = pipeline.run(&config)?;
    println!("Video written to {}", report.output.display());

    if config.show_stats {
        println!("{}", report.summary());
        report
            .append_benchmark(Path::new(BENCHMARK_LOG), env!("CARGO_PKG_VERSION"), &config.input)
            .context("writing benchmark log")?;
    }
    Ok(())
}

/// Stretch the video to the narration length when audio sync is on.
fn sync_to_narration(config: &mut Config) {
    if !config.audio_sync {
        return;
    }
    let Some(audio) = &config.audio else {
        return;
    };
    match probe_duration(audio) {
        Ok(secs) => {
            info!(audio = %audio.display(), duration = secs, "Matching video length to narration");
            config.total_duration = secs;
        }
        Err(e) => warn!(audio = %audio.display(), error = %e, "Could not read narration length"),
    }
}
