//! Integration tests for the PetService → FSM → display pipeline.
//!
//! Drive a full session on a virtual millisecond timeline and assert on
//! what the display showed and which events were emitted.

use super::mock_hw::{LogSink, MockConfigStore, RecordingDisplay};

use petpal::app::commands::AppCommand;
use petpal::app::events::AppEvent;
use petpal::app::ports::ConfigPort;
use petpal::app::service::PetService;
use petpal::config::PetConfig;
use petpal::error::{Error, InferenceError, InitFailure};
use petpal::fsm::StateId;
use petpal::fsm::context::StatusMessage;
use petpal::smoother::ConfidenceSample;

fn make_app(config: PetConfig) -> (PetService, RecordingDisplay, LogSink) {
    let mut app = PetService::new(config).expect("valid config");
    let mut display = RecordingDisplay::new();
    let mut sink = LogSink::new();
    app.start(0, &mut display, &mut sink);
    (app, display, sink)
}

fn one(label: &str, p: f32) -> Vec<ConfidenceSample> {
    vec![ConfidenceSample::new(label, p)]
}

// ── Start screen ──────────────────────────────────────────────

#[test]
fn starts_on_greeting_behind_overlay() {
    let (app, display, sink) = make_app(PetConfig::default());
    assert_eq!(app.state(), StateId::Start);
    assert!(app.overlay_visible());
    assert_eq!(sink.events, vec![AppEvent::Started(StateId::Start)]);

    let view = display.last().expect("initial render");
    assert_eq!(view.image, StateId::Start);
    assert_eq!(view.status, StatusMessage::Greeting);
    assert!(view.overlay_visible);
}

// ── Manual feeding lifecycle ──────────────────────────────────

#[test]
fn feed_hold_then_neutral_then_sad() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());

    app.press(0, "carrot", &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);
    assert!(!app.overlay_visible());
    assert_eq!(app.view().status.to_string(), "Thank you!");
    assert_eq!(sink.fed_events(), vec![&AppEvent::Fed { at: 0, manual: true }]);

    app.advance(2_999, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);

    app.advance(3_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Neutral);
    assert_eq!(app.view().status.to_string(), "Waiting...");

    app.advance(59_999, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Neutral);

    app.advance(60_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Sad);
    assert_eq!(app.view().status.to_string(), "I miss food...");

    assert_eq!(display.last().map(|v| v.image), Some(StateId::Sad));
}

#[test]
fn second_feeding_extends_happy_hold() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.press(0, "carrot", &mut display, &mut sink);
    app.press(2_000, "carrot", &mut display, &mut sink);
    assert_eq!(app.feedings(), 2);

    app.advance(3_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy, "first hold was superseded");

    app.advance(5_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Neutral);
}

#[test]
fn food_match_is_case_insensitive_substring() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.press(100, "Baby-Carrots", &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);
    assert_eq!(app.last_fed_at(), 100);
}

#[test]
fn feeding_while_sad_makes_happy() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.advance(60_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Sad);

    app.press(61_000, "carrot", &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);
    assert_eq!(app.last_fed_at(), 61_000);

    app.advance(64_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Neutral);
}

// ── Non-food button ───────────────────────────────────────────

#[test]
fn non_food_press_shows_label_then_reverts() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.press(0, "carrot", &mut display, &mut sink);
    app.advance(3_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Neutral);

    app.press(10_000, "ball", &mut display, &mut sink);
    assert_eq!(app.view().status.to_string(), "Seen: ball (not food)");
    assert_eq!(app.last_fed_at(), 0, "non-food never feeds");

    app.advance(11_499, &mut display, &mut sink);
    assert_eq!(app.view().status.to_string(), "Seen: ball (not food)");

    app.advance(11_500, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Neutral);
    assert_eq!(app.view().status.to_string(), "Waiting...");
}

#[test]
fn non_food_press_does_not_dismiss_overlay() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.press(100, "ball", &mut display, &mut sink);
    assert!(app.overlay_visible());
    assert_eq!(app.state(), StateId::Start);
}

#[test]
fn stale_revert_does_not_clobber_feeding() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.press(1_000, "ball", &mut display, &mut sink);
    app.press(2_000, "carrot", &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);

    // The ball revert would have fired at 2_500.
    app.advance(2_500, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);
    assert_eq!(app.view().status.to_string(), "Thank you!");

    app.advance(5_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Neutral);
}

#[test]
fn non_food_press_keeps_feeding_hold_deadline() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.press(0, "carrot", &mut display, &mut sink);
    app.press(2_900, "ball", &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);
    assert_eq!(app.view().status.to_string(), "Seen: ball (not food)");

    app.advance(2_999, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);
    app.advance(3_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Neutral);
    assert_eq!(app.view().status.to_string(), "Waiting...");

    // The ball revert at 4_400 was issued before the transition.
    let transitions = sink.count(|e| matches!(e, AppEvent::StateChanged { .. }));
    app.advance(4_400, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Neutral);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::StateChanged { .. })),
        transitions
    );
}

#[test]
fn non_food_press_while_sad_stays_sad() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.advance(60_000, &mut display, &mut sink);
    app.press(61_000, "ball", &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Sad);

    app.advance(62_500, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Sad);
    assert_eq!(app.view().status, StatusMessage::MissingFood);
}

// ── Hunger vs. display hold ───────────────────────────────────

#[test]
fn hunger_tick_interrupts_happy_hold() {
    let mut cfg = PetConfig::default();
    cfg.sad_after_ms = 4_000;
    cfg.display_hold_ms = 10_000;
    let (mut app, mut display, mut sink) = make_app(cfg);

    app.press(0, "carrot", &mut display, &mut sink);
    app.advance(3_999, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);

    app.advance(4_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Sad);

    // The superseded hold settle must not pull the pet out of Sad.
    app.advance(10_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Sad);
}

#[test]
fn coarse_advance_fires_timers_in_order() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.press(0, "carrot", &mut display, &mut sink);
    sink.events.clear();

    app.advance(120_000, &mut display, &mut sink);
    let transitions: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (StateId::Happy, StateId::Neutral),
            (StateId::Neutral, StateId::Sad)
        ]
    );
}

// ── Camera-driven feeding ─────────────────────────────────────

#[test]
fn five_sustained_ticks_feed_exactly_once() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    for t in [0, 300, 600, 900, 1_200] {
        app.observe(t, &one("carrot", 0.9), &mut display, &mut sink);
    }
    assert_eq!(sink.fed_events(), vec![&AppEvent::Fed { at: 1_200, manual: false }]);
    assert_eq!(app.pending_detection_since(), None);

    // The run continues; a fresh hold is needed before the next feeding.
    app.observe(1_500, &one("carrot", 0.9), &mut display, &mut sink);
    assert_eq!(app.pending_detection_since(), Some(1_500));
    assert_eq!(app.feedings(), 1);
}

#[test]
fn flickering_confidence_never_feeds() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    let probs = [0.9, 0.1, 0.9, 0.1, 0.9, 0.1, 0.9, 0.1];
    for (i, p) in probs.iter().enumerate() {
        app.observe(i as u64 * 300, &one("carrot", *p), &mut display, &mut sink);
    }
    assert_eq!(app.feedings(), 0);
    let avg = app.label_average("carrot").expect("tracked");
    assert!((avg - 0.42).abs() < 1e-5, "avg = {avg}");
}

#[test]
fn top_prediction_wins() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    let preds = vec![
        ConfidenceSample::new("carrot", 0.05),
        ConfidenceSample::new("mug", 0.95),
    ];
    app.observe(0, &preds, &mut display, &mut sink);
    assert_eq!(app.view().status.to_string(), "Seen: mug (95%)");
    assert_eq!(app.label_average("carrot"), None);
    assert!(!app.overlay_visible(), "any stable sighting dismisses the overlay");
}

#[test]
fn tied_predictions_sample_the_later_label() {
    let mut cfg = PetConfig::default();
    cfg.confidence_threshold = 0.5;
    let (mut app, mut display, mut sink) = make_app(cfg);
    let preds = vec![
        ConfidenceSample::new("carrot", 0.5),
        ConfidenceSample::new("ball", 0.5),
    ];
    app.observe(0, &preds, &mut display, &mut sink);
    assert!(app.label_average("ball").is_some());
    assert_eq!(app.label_average("carrot"), None);
    assert_eq!(app.state(), StateId::Start);
}

#[test]
fn sample_all_labels_tracks_every_prediction() {
    let mut cfg = PetConfig::default();
    cfg.sample_all_labels = true;
    let (mut app, mut display, mut sink) = make_app(cfg);
    let preds = vec![
        ConfidenceSample::new("carrot", 0.05),
        ConfidenceSample::new("mug", 0.95),
    ];
    app.observe(0, &preds, &mut display, &mut sink);
    assert!(app.label_average("carrot").is_some());
    assert!(app.label_average("mug").is_some());
}

#[test]
fn non_food_sighting_restarts_hold() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.observe(0, &one("carrot", 0.95), &mut display, &mut sink);
    app.observe(300, &one("carrot", 0.95), &mut display, &mut sink);
    app.observe(600, &one("ball", 0.95), &mut display, &mut sink);
    assert_eq!(app.pending_detection_since(), Some(600));

    for t in [900, 1_200, 1_500] {
        app.observe(t, &one("carrot", 0.95), &mut display, &mut sink);
    }
    assert_eq!(app.feedings(), 0);

    app.observe(1_600, &one("carrot", 0.95), &mut display, &mut sink);
    assert_eq!(app.feedings(), 1);
}

#[test]
fn non_food_sighting_keeps_hold_when_disabled() {
    let mut cfg = PetConfig::default();
    cfg.non_food_resets_hold = false;
    let (mut app, mut display, mut sink) = make_app(cfg);
    app.observe(0, &one("carrot", 0.95), &mut display, &mut sink);
    app.observe(600, &one("ball", 0.95), &mut display, &mut sink);
    assert_eq!(app.pending_detection_since(), Some(0));

    app.observe(1_000, &one("carrot", 0.95), &mut display, &mut sink);
    assert_eq!(app.feedings(), 1);
}

#[test]
fn empty_prediction_is_a_quiet_tick() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    let renders = display.views.len();
    app.observe(100, &[], &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Start);
    assert_eq!(display.views.len(), renders);
    assert_eq!(app.stats().frames_classified, 1);
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn invalid_probability_skips_tick() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.observe(0, &one("carrot", f32::NAN), &mut display, &mut sink);
    app.observe(300, &one("carrot", 1.5), &mut display, &mut sink);

    assert_eq!(app.stats().inference_failures, 2);
    assert_eq!(app.stats().frames_classified, 0);
    assert_eq!(app.label_average("carrot"), None);
    assert_eq!(
        sink.count(|e| *e == AppEvent::InferenceFailed(InferenceError::InvalidOutput)),
        2
    );
}

#[test]
fn missing_model_degrades_to_manual() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.report_init_failure(InitFailure::ClassifierUnavailable, &mut display, &mut sink);
    assert_eq!(app.view().status.to_string(), "Model not loaded.");
    assert!(sink.events.contains(&AppEvent::InitFailed(InitFailure::ClassifierUnavailable)));

    app.press(500, "carrot", &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);
}

// ── Display output ────────────────────────────────────────────

#[test]
fn display_renders_only_on_change() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.press(0, "carrot", &mut display, &mut sink);
    let renders = display.views.len();

    app.advance(1_000, &mut display, &mut sink);
    app.advance(2_000, &mut display, &mut sink);
    assert_eq!(display.views.len(), renders, "hunger ticks while fed change nothing");

    app.advance(3_000, &mut display, &mut sink);
    assert_eq!(display.views.len(), renders + 1);
}

// ── Commands & telemetry ──────────────────────────────────────

#[test]
fn force_state_command() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.handle_command(1_000, AppCommand::ForceState(StateId::Neutral), &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Neutral);
    assert_eq!(app.feedings(), 0);
}

#[test]
fn press_command_routes_to_press() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.handle_command(10, AppCommand::Press("carrot".into()), &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);
    assert_eq!(app.stats().manual_presses, 1);
}

#[test]
fn telemetry_snapshot_on_demand() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.press(0, "carrot", &mut display, &mut sink);
    app.observe(500, &one("carrot", 0.95), &mut display, &mut sink);
    sink.events.clear();

    app.handle_command(700, AppCommand::EmitTelemetry, &mut display, &mut sink);
    let Some(AppEvent::Telemetry(t)) = sink.events.first() else {
        panic!("expected telemetry, got {:?}", sink.events);
    };
    assert_eq!(t.state, StateId::Happy);
    assert_eq!(t.ms_in_state, 700);
    assert_eq!(t.since_fed_ms, 700);
    assert_eq!(t.pending_detection_ms, Some(200));
    assert_eq!(t.feedings, 1);
    assert_eq!(t.manual_presses, 1);
    assert_eq!(t.frames_classified, 1);
    assert_eq!(t.tracked_labels, 1);
}

#[test]
fn runtime_config_update_changes_food() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    let mut cfg = PetConfig::default();
    cfg.food_keyword = "apple".into();
    app.handle_command(0, AppCommand::UpdateConfig(cfg), &mut display, &mut sink);

    app.press(10, "carrot", &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Start);
    app.press(20, "green apple", &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Happy);
}

#[test]
fn config_update_fires_overdue_hunger_check_first() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    let mut cfg = PetConfig::default();
    cfg.hunger_check_interval_ms = 3_000;
    app.handle_command(61_000, AppCommand::UpdateConfig(cfg), &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Sad);

    app.advance(61_000, &mut display, &mut sink);
    assert_eq!(app.state(), StateId::Sad);
    assert_eq!(app.current_config().hunger_check_interval_ms, 3_000);
}

#[test]
fn telemetry_snapshot_reflects_overdue_settle() {
    let (mut app, mut display, mut sink) = make_app(PetConfig::default());
    app.press(0, "carrot", &mut display, &mut sink);
    sink.events.clear();

    app.handle_command(3_500, AppCommand::EmitTelemetry, &mut display, &mut sink);
    let Some(AppEvent::Telemetry(t)) = sink.events.last() else {
        panic!("expected telemetry, got {:?}", sink.events);
    };
    assert_eq!(t.state, StateId::Neutral);
    assert_eq!(t.ms_in_state, 500);
    assert_eq!(app.state(), StateId::Neutral);
}

// ── Configuration port ────────────────────────────────────────

#[test]
fn service_from_config_port() {
    let store = MockConfigStore::new();
    let mut cfg = PetConfig::default();
    cfg.hold_time_ms = 250;
    store.save(&cfg).expect("valid");

    let app = PetService::from_port(&store).expect("loads");
    assert_eq!(app.current_config().hold_time_ms, 250);
}

#[test]
fn corrupted_config_is_an_error() {
    let mut store = MockConfigStore::new();
    store.corrupted = true;
    assert_eq!(
        PetService::from_port(&store).err(),
        Some(Error::Config("corrupted"))
    );
}
