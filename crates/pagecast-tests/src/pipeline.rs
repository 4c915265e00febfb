//! Integration tests for the render/encode pipeline against mock collaborators.

use crate::mocks::{MockEncoder, MockSource};
use pagecast_core::{CancelToken, PagecastError, Transition};
use pagecast_director::Scenario;
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
        encode_workers: 2,
        seed: Some(7),
        ..Default::default()
    }
}

fn pipeline(source: MockSource, encoder: Arc<MockEncoder>) -> Pipeline {
    Pipeline::new(Arc::new(source), encoder, CancelToken::new())
}

#[test]
fn every_page_is_encoded_and_assembled_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = Arc::new(MockEncoder::default());
    let config = config(dir.path());

    let report = pipeline(MockSource::new(5, 200, 200), encoder.clone())
        .run(&config)
        .unwrap();

    assert_eq!(report.pages, 5);
    assert_eq!((report.width, report.height), (1280, 720));
    assert!((report.video_duration - 10.0).abs() < 1e-4);
    assert!(config.output.exists());

    let concatenated = encoder.concatenated.lock();
    let (segments, settings) = concatenated.as_ref().unwrap();
    let names: Vec<String> = segments
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["s0.mp4", "s1.mp4", "s2.mp4", "s3.mp4", "s4.mp4"]);

    assert_eq!(settings.transition, Transition::Fade);
    assert_eq!(settings.durations.len(), 5);
    let sum: f64 = settings.durations.iter().sum();
    assert!((sum - 4.0 * settings.fade_duration - 10.0).abs() < 1e-4);
}

#[test]
fn default_motion_is_breathing_zoom() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = Arc::new(MockEncoder::default());
    pipeline(MockSource::new(2, 200, 200), encoder.clone())
        .run(&config(dir.path()))
        .unwrap();

    let filter = encoder.filter_for(1).unwrap();
    assert!(filter.contains("zoompan=z='"));
    assert!(filter.contains("scale=2560:1440"));
    assert!(!filter.contains("drawtext"));
}

#[test]
fn auto_aspect_follows_the_first_page() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        auto_aspect: true,
        ..config(dir.path())
    };
    let report = pipeline(MockSource::new(1, 300, 400), Arc::new(MockEncoder::default()))
        .run(&config)
        .unwrap();
    assert_eq!((report.width, report.height), (540, 720));
}

#[test]
fn failed_encode_is_a_missing_segment() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = Arc::new(MockEncoder {
        fail_page: Some(2),
        ..Default::default()
    });
    let config = config(dir.path());

    let err = pipeline(MockSource::new(4, 200, 200), encoder.clone())
        .run(&config)
        .unwrap_err();

    assert!(matches!(err, PagecastError::MissingSegment { page: 2 }), "got {err:?}");
    assert!(encoder.concatenated.lock().is_none());
    assert!(!config.output.exists());
}

#[test]
fn failed_render_is_a_missing_segment() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MockSource::new(3, 200, 200);
    source.fail_page = Some(0);

    let err = pipeline(source, Arc::new(MockEncoder::default()))
        .run(&config(dir.path()))
        .unwrap_err();
    assert!(matches!(err, PagecastError::MissingSegment { page: 0 }), "got {err:?}");
}

#[test]
fn invalid_config_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = Arc::new(MockEncoder::default());
    let config = Config {
        width: 1279,
        ..config(dir.path())
    };

    let err = pipeline(MockSource::new(2, 200, 200), encoder.clone())
        .run(&config)
        .unwrap_err();
    assert!(matches!(err, PagecastError::Config(_)));
    assert!(encoder.filter_for(0).is_none());
}

#[test]
fn empty_source_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = pipeline(MockSource::new(0, 200, 200), Arc::new(MockEncoder::default()))
        .run(&config(dir.path()))
        .unwrap_err();
    assert!(matches!(err, PagecastError::Config(_)));
}

#[test]
fn generated_scenario_drives_the_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let scenario_path = dir.path().join("scenarios").join("deck.yaml");

    let generate = Config {
        generate_scenario: true,
        scenario_output: Some(scenario_path.clone()),
        ..config(dir.path())
    };
    let scenario = pipeline(MockSource::new(3, 400, 400), Arc::new(MockEncoder::default()))
        .generate_scenario(&generate)
        .unwrap();

    assert_eq!(scenario.slides.len(), 3);
    assert_eq!(scenario.slides[2].input, "slide_3.png");
    assert!(scenario.slides.iter().all(|s| s.keyframes.iter().any(|k| k.zoom > 1.0)));
    assert_eq!(Scenario::load_from_file(&scenario_path).unwrap(), scenario);

    let encoder = Arc::new(MockEncoder::default());
    let render = Config {
        scenario_input: Some(scenario_path),
        total_duration: 12.0,
        ..config(dir.path())
    };
    let report = pipeline(MockSource::new(3, 400, 400), encoder.clone())
        .run(&render)
        .unwrap();

    assert!((report.video_duration - 12.0).abs() < 0.1);
    for page in 0..3 {
        let filter = encoder.filter_for(page).unwrap();
        assert!(filter.contains("zoompan="), "page {page}: {filter}");
    }
}

#[test]
fn blank_pages_fall_back_to_full_view() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MockSource::new(2, 200, 200);
    source.fail_page = Some(1);

    let config = Config {
        generate_scenario: true,
        scenario_output: Some(dir.path().join("s.json")),
        ..config(dir.path())
    };
    let scenario = pipeline(source, Arc::new(MockEncoder::default()))
        .generate_scenario(&config)
        .unwrap();

    let fallback = &scenario.slides[1];
    assert!(fallback.keyframes.iter().all(|k| k.is_full_view()));
    assert!(dir.path().join("s.json").exists());
}

#[test]
fn debug_label_needs_drawtext() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        debug: true,
        ..config(dir.path())
    };

    let encoder = Arc::new(MockEncoder::default());
    pipeline(MockSource::new(2, 200, 200), encoder.clone())
        .run(&config)
        .unwrap();
    assert!(encoder.filter_for(1).unwrap().contains("drawtext=text='Slide 2'"));

    let encoder = Arc::new(MockEncoder {
        missing_filters: vec!["drawtext"],
        ..Default::default()
    });
    pipeline(MockSource::new(2, 200, 200), encoder.clone())
        .run(&config)
        .unwrap();
    for page in 0..2 {
        assert!(!encoder.filter_for(page).unwrap().contains("drawtext"));
    }
}

#[test]
fn debug_boxes_need_drawbox() {
    let dir = tempfile::tempdir().unwrap();
    let scenario_path = dir.path().join("deck.json");
    let generate = Config {
        generate_scenario: true,
        scenario_output: Some(scenario_path.clone()),
        ..config(dir.path())
    };
    pipeline(MockSource::new(2, 400, 400), Arc::new(MockEncoder::default()))
        .generate_scenario(&generate)
        .unwrap();

    let render = Config {
        scenario_input: Some(scenario_path),
        debug: true,
        ..config(dir.path())
    };

    let encoder = Arc::new(MockEncoder::default());
    pipeline(MockSource::new(2, 400, 400), encoder.clone())
        .run(&render)
        .unwrap();
    let filter = encoder.filter_for(0).unwrap();
    assert!(filter.contains(",drawbox=x="), "{filter}");

    let encoder = Arc::new(MockEncoder {
        missing_filters: vec!["drawbox"],
        ..Default::default()
    });
    pipeline(MockSource::new(2, 400, 400), encoder.clone())
        .run(&render)
        .unwrap();
    let filter = encoder.filter_for(0).unwrap();
    assert!(!filter.contains("drawbox"), "{filter}");
    assert!(filter.contains("drawtext"));
}

#[test]
fn source_is_closed_once_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(MockSource::new(3, 200, 200));
    Pipeline::new(source.clone(), Arc::new(MockEncoder::default()), CancelToken::new())
        .run(&config(dir.path()))
        .unwrap();
    assert_eq!(source.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn source_is_closed_when_the_run_fails() {
    let dir = tempfile::tempdir().unwrap();

    let source = Arc::new(MockSource::new(3, 200, 200));
    let encoder = Arc::new(MockEncoder {
        fail_page: Some(1),
        ..Default::default()
    });
    let err = Pipeline::new(source.clone(), encoder, CancelToken::new())
        .run(&config(dir.path()))
        .unwrap_err();
    assert!(matches!(err, PagecastError::MissingSegment { page: 1 }));
    assert_eq!(source.closed.load(Ordering::SeqCst), 1);

    let source = Arc::new(MockSource::new(3, 200, 200));
    let invalid = Config {
        fps: 0,
        ..config(dir.path())
    };
    Pipeline::new(source.clone(), Arc::new(MockEncoder::default()), CancelToken::new())
        .run(&invalid)
        .unwrap_err();
    assert_eq!(source.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn source_is_closed_after_generation() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(MockSource::new(2, 200, 200));
    let config = Config {
        generate_scenario: true,
        scenario_output: Some(dir.path().join("s.yaml")),
        ..config(dir.path())
    };
    Pipeline::new(source.clone(), Arc::new(MockEncoder::default()), CancelToken::new())
        .generate_scenario(&config)
        .unwrap();
    assert_eq!(source.closed.load(Ordering::SeqCst), 1);
}
