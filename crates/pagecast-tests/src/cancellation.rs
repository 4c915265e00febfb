//! Integration tests for cancelling a run part-way through.

use crate::mocks::{MockEncoder, MockSource};
use pagecast_core::{CancelToken, PagecastError};
use pagecast_engine::{Config, Pipeline};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn config(out_dir: &Path) -> Config {
    Config {
        output: out_dir.join("talk.mp4"),
        page_duration: 2.0,
        auto_aspect: false,
        workers: 2,
        encode_workers: 1,
        seed: Some(3),
        ..Default::default()
    }
}

#[test]
fn cancel_after_first_segment_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = Arc::new(MockEncoder {
        cancel_after: Some(1),
        ..Default::default()
    });
    let cancel = CancelToken::new();
    let pipeline = Pipeline::new(Arc::new(MockSource::new(6, 200, 200)), encoder.clone(), cancel.clone());
    let config = config(dir.path());

    let err = pipeline.run(&config).unwrap_err();

    assert!(err.is_cancelled(), "expected cancellation, got {err:?}");
    assert!(matches!(err, PagecastError::Cancelled));
    assert!(cancel.is_cancelled());
    assert_eq!(encoder.encoded.load(Ordering::SeqCst), 1);
    assert!(encoder.concatenated.lock().is_none());
    assert!(!config.output.exists());
}

#[test]
fn cancelled_before_start_does_no_work() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = Arc::new(MockEncoder::default());
    let cancel = CancelToken::new();
    cancel.cancel();
    let pipeline = Pipeline::new(Arc::new(MockSource::new(4, 200, 200)), encoder.clone(), cancel);

    let err = pipeline.run(&config(dir.path())).unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(encoder.encoded.load(Ordering::SeqCst), 0);
}

#[test]
fn cancel_during_assembly_removes_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = Arc::new(MockEncoder {
        interrupt_assembly: true,
        ..Default::default()
    });
    let pipeline = Pipeline::new(Arc::new(MockSource::new(3, 200, 200)), encoder.clone(), CancelToken::new());
    let config = config(dir.path());

    let err = pipeline.run(&config).unwrap_err();
    assert!(matches!(err, PagecastError::Cancelled));
    assert_eq!(encoder.encoded.load(Ordering::SeqCst), 3);
    assert!(!config.output.exists());
}

#[test]
fn cancelled_generation_writes_no_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let pipeline = Pipeline::new(
        Arc::new(MockSource::new(2, 200, 200)),
        Arc::new(MockEncoder::default()),
        cancel,
    );
    let scenario_path = dir.path().join("scenario.yaml");
    let config = Config {
        generate_scenario: true,
        scenario_output: Some(scenario_path.clone()),
        ..config(dir.path())
    };

    let err = pipeline.generate_scenario(&config).unwrap_err();
    assert!(err.is_cancelled());
    assert!(!scenario_path.exists());
}
