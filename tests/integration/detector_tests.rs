//! Integration tests for the camera → classifier → PetService path.

use super::mock_hw::{LogSink, MockCamera, MockClassifier, RecordingDisplay};

use petpal::app::detector::Detector;
use petpal::app::events::AppEvent;
use petpal::app::service::PetService;
use petpal::config::PetConfig;
use petpal::error::{InferenceError, InitFailure};
use petpal::fsm::StateId;

fn make_app() -> (PetService, RecordingDisplay, LogSink) {
    let mut app = PetService::new(PetConfig::default()).expect("valid config");
    let mut display = RecordingDisplay::new();
    let mut sink = LogSink::new();
    app.start(0, &mut display, &mut sink);
    (app, display, sink)
}

#[test]
fn sustained_carrot_feeds_through_detector() {
    let (mut app, mut display, mut sink) = make_app();
    let classifier = MockClassifier::new().then("carrot", 0.9);
    let mut detector = Detector::new(Some(MockCamera::new()), Some(classifier));
    assert!(detector.is_active());

    for t in [0, 300, 600, 900, 1_200] {
        assert!(detector.tick(t, &mut app, &mut display, &mut sink));
    }
    assert_eq!(app.state(), StateId::Happy);
    assert_eq!(sink.fed_events(), vec![&AppEvent::Fed { at: 1_200, manual: false }]);
    assert_eq!(app.stats().frames_classified, 5);
}

#[test]
fn classifier_error_skips_tick() {
    let (mut app, mut display, mut sink) = make_app();
    let classifier = MockClassifier::new()
        .then_fail(InferenceError::Backend("tensor shape"))
        .then("carrot", 0.9);
    let mut detector = Detector::new(Some(MockCamera::new()), Some(classifier));

    assert!(!detector.tick(0, &mut app, &mut display, &mut sink));
    assert_eq!(app.state(), StateId::Start);
    assert!(app.overlay_visible());
    assert_eq!(app.stats().inference_failures, 1);
    assert!(sink
        .events
        .contains(&AppEvent::InferenceFailed(InferenceError::Backend("tensor shape"))));

    // The loop carries on with the next tick.
    assert!(detector.tick(300, &mut app, &mut display, &mut sink));
    assert!(!app.overlay_visible());
}

#[test]
fn camera_error_skips_tick() {
    let (mut app, mut display, mut sink) = make_app();
    let mut camera = MockCamera::new();
    camera.fail_next(InferenceError::FrameUnavailable);
    let mut detector = Detector::new(Some(camera), Some(MockClassifier::new().then("carrot", 0.9)));

    assert!(!detector.tick(0, &mut app, &mut display, &mut sink));
    assert_eq!(detector.classifier_mut().map(|c| c.calls), Some(0));
    assert!(sink
        .events
        .contains(&AppEvent::InferenceFailed(InferenceError::FrameUnavailable)));
}

#[test]
fn missing_classifier_leaves_detector_idle() {
    let (mut app, mut display, mut sink) = make_app();
    let mut detector: Detector<MockCamera, MockClassifier> = Detector::from_init(
        Ok(MockCamera::new()),
        Err(InitFailure::ClassifierUnavailable),
        &mut app,
        &mut display,
        &mut sink,
    );
    assert!(!detector.is_active());
    assert!(!detector.tick(0, &mut app, &mut display, &mut sink));
    assert_eq!(detector.camera_mut().map(|c| c.updates), Some(1));
    assert_eq!(app.view().status.to_string(), "Model not loaded.");

    app.press(100, "carrot", &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);
}

#[test]
fn missing_camera_reports_once() {
    let (mut app, mut display, mut sink) = make_app();
    let mut detector: Detector<MockCamera, MockClassifier> = Detector::from_init(
        Err(InitFailure::CameraUnavailable),
        Ok(MockClassifier::new()),
        &mut app,
        &mut display,
        &mut sink,
    );
    for t in [0, 33, 66] {
        assert!(!detector.tick(t, &mut app, &mut display, &mut sink));
    }
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::InitFailed(InitFailure::CameraUnavailable))),
        1
    );
    assert_eq!(app.stats().inference_failures, 0);
}
