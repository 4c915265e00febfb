//! Integration tests for detection, camera planning and motion synthesis.

use crate::mocks::paint_page;
use pagecast_analysis::{create_detector, ContrastConfig, DetectorVariant};
use pagecast_core::{DebugOverlays, FrameBuffer, PixelFormat, Rect, SegmentParams, ZoomMode};
use pagecast_director::{Director, Scenario, SCENARIO_VERSION};
use pagecast_motion::{interpolate, Effect, ScenarioEffect};
use std::sync::Arc;

fn page(width: u32, height: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height, PixelFormat::Rgba8);
    paint_page(&mut frame);
    frame
}

fn params(page_index: usize, duration: f64) -> SegmentParams {
    SegmentParams {
        width: 1280,
        height: 720,
        fps: 30,
        duration,
        fade_duration: 0.5,
        outro_duration: 1.0,
        zoom_mode: ZoomMode::Center,
        zoom_speed: 0.001,
        page_index,
        debug: DebugOverlays::OFF,
        filter: String::new(),
    }
}

#[test]
fn white_square_is_detected_where_it_is() {
    let detector = create_detector("contrast", &ContrastConfig::default()).unwrap();
    let blocks = detector.detect(&page(200, 200)).unwrap();

    let found = blocks.iter().any(|b| {
        let r = b.rect;
        (r.x - 50).abs() <= 6 && (r.y - 50).abs() <= 6 && r.w >= 80 && r.h >= 80
    });
    assert!(found, "no block near the white square: {blocks:?}");
}

#[test]
fn unbuilt_detectors_are_reported() {
    assert!(DetectorVariant::Ocr.build(&ContrastConfig::default()).is_err());
    assert!(create_detector("ai", &ContrastConfig::default()).is_err());
    assert!(create_detector("sonar", &ContrastConfig::default()).is_err());
}

#[test]
fn detected_page_drives_a_zoom_path() {
    let frame = page(400, 400);
    let detector = create_detector("contrast", &ContrastConfig::default()).unwrap();
    let blocks = detector.detect(&frame).unwrap();

    let director = Director::new(1280, 720).with_page_size(frame.width, frame.height);
    let slide = director.plan_slide(1, &blocks, "slide_1.png", 6.0, 0.5, 1.0).unwrap();
    assert!(slide.is_monotonic());
    assert!(slide.keyframes.iter().any(|k| k.zoom > 1.0));

    // Letterboxed into the 1280 wide viewport, the square sits mid-frame.
    let zoomed = slide.keyframes.iter().find(|k| k.zoom > 1.0).unwrap();
    let c = zoomed.rect.center();
    assert!((c.x - 640.0).abs() < 20.0 && (c.y - 360.0).abs() < 20.0, "center {c:?}");

    let peak = interpolate(&slide.keyframes, zoomed.time).unwrap();
    assert_eq!(peak.zoom, zoomed.zoom);

    let effect = ScenarioEffect::new(Arc::new(Scenario::new(vec![slide])));
    let filter = effect.filter(&params(0, 6.0));
    assert!(filter.contains("zoompan="));
    assert!(filter.ends_with("scale=1280:720"));
}

#[test]
fn two_block_page_plans_one_slide() {
    let blocks = [
        pagecast_analysis::Block::new(Rect::new(100, 100, 200, 150), 0.7),
        pagecast_analysis::Block::new(Rect::new(700, 400, 300, 200), 0.7),
    ];
    let scenario = Director::new(1280, 720)
        .generate_scenario(&blocks, "page_1", 10.0, 0.5, 1.0)
        .unwrap();

    assert_eq!(scenario.version, SCENARIO_VERSION);
    assert_eq!(scenario.version, "1.0");
    assert_eq!(scenario.slides.len(), 1);
    assert!(scenario.slides[0].keyframes.len() >= 3);
}

#[test]
fn scenario_file_round_trips_into_motion() {
    let blocks = [pagecast_analysis::Block::new(Rect::new(200, 100, 300, 200), 0.9)];
    let scenario = Director::new(1280, 720)
        .generate_scenario(&blocks, "slide_1.png", 8.0, 0.5, 1.0)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.yaml");
    scenario.save_to_file(&path).unwrap();
    let loaded = Scenario::load_from_file(&path).unwrap();
    assert_eq!(loaded, scenario);

    // Same plan, same filter, even when the clip is retimed.
    let a = ScenarioEffect::new(Arc::new(scenario)).filter(&params(0, 5.0));
    let b = ScenarioEffect::new(Arc::new(loaded)).filter(&params(0, 5.0));
    assert_eq!(a, b);
}

#[test]
fn pages_beyond_the_scenario_hold_still() {
    let effect = ScenarioEffect::new(Arc::new(Scenario::default()));
    let keyframes = effect.keyframes_for(&params(3, 4.0));
    assert_eq!(keyframes.len(), 1);
    assert!(keyframes[0].is_full_view());
    assert!(effect.filter(&params(3, 4.0)).contains("zoompan="));
}
