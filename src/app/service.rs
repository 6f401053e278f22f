//! Application service, the hexagonal core.
//!
//! [`PetService`] owns the smoother, the FSM, the scheduler, the event
//! queue and the shared context: the complete session state, passed by
//! `&mut self` into every handler.  All I/O flows through port traits
//! injected at call sites.
//!
//! ```text
//!  press / observe ──▶ ┌───────────────────────────────┐ ──▶ EventSink
//!                      │          PetService           │
//!        advance ─────▶│ Smoother · Queue · FSM · Timer│ ──▶ DisplayPort
//!                      └───────────────────────────────┘
//! ```
//!
//! Every entry point first fires the timers that fell due before its
//! timestamp, then queues its own event, then drains the queue.  Timer
//! fires are dispatched at their due time, so the virtual timeline stays
//! ordered no matter how coarsely the caller advances it.

use log::{info, warn};

use crate::config::PetConfig;
use crate::error::{InferenceError, InitFailure};
use crate::events::{EventQueue, QueuedEvent};
use crate::fsm::context::{Millis, PetContext, StatusMessage};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, PetEvent, StateId, Transition};
use crate::scheduler::{Schedule, ScheduleAction, ScheduleKind, Scheduler};
use crate::smoother::{ClassificationSmoother, ConfidenceSample};

use super::commands::AppCommand;
use super::events::{AppEvent, SessionTelemetry};
use super::ports::{
    ConfigError, ConfigPort, DisplayPort, DisplayView, EventSink, ScheduleFired, SchedulerDelegate,
};

const HUNGER_CHECK: &str = "hunger-check";
const TELEMETRY: &str = "telemetry";

/// Counters kept for telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_classified: u64,
    pub inference_failures: u64,
    pub manual_presses: u64,
}

// ───────────────────────────────────────────────────────────────
// Scheduler → queue bridge
// ───────────────────────────────────────────────────────────────

/// Translates scheduler fires into queued FSM events.  Telemetry is not an
/// FSM concern, so it is reported back to the service instead.
struct QueueDelegate<'a> {
    queue: &'a mut EventQueue,
    telemetry_at: Option<Millis>,
}

impl SchedulerDelegate for QueueDelegate<'_> {
    fn on_schedule_fired(&mut self, fired: &ScheduleFired) {
        match fired.action {
            ScheduleAction::HungerCheck => {
                self.queue.push(fired.due_ms, PetEvent::HungerTick);
            }
            ScheduleAction::Settle { token, reason } => {
                self.queue.push(fired.due_ms, PetEvent::Settle { token, reason });
            }
            ScheduleAction::Telemetry => self.telemetry_at = Some(fired.due_ms),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// PetService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct PetService {
    fsm: Fsm,
    ctx: PetContext,
    smoother: ClassificationSmoother,
    scheduler: Scheduler,
    queue: EventQueue,
    stats: SessionStats,
    /// Last view handed to the display; renders are skipped when unchanged.
    last_view: Option<DisplayView>,
    started: bool,
}

impl PetService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: PetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let smoother = ClassificationSmoother::new(&config);
        Ok(Self {
            fsm: Fsm::new(build_state_table(), StateId::Start),
            ctx: PetContext::new(config, 0),
            smoother,
            scheduler: Scheduler::new(),
            queue: EventQueue::new(),
            stats: SessionStats::default(),
            last_view: None,
            started: false,
        })
    }

    /// Load configuration through `port` and construct the service.
    pub fn from_port(port: &impl ConfigPort) -> crate::error::Result<Self> {
        let config = port.load()?;
        Ok(Self::new(config)?)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Show the start screen and arm the periodic timers.  `now` counts as
    /// the last feeding.
    pub fn start(&mut self, now: Millis, display: &mut impl DisplayPort, sink: &mut impl EventSink) {
        if self.started {
            warn!("PetService already started");
            return;
        }
        self.ctx.now_ms = now;
        self.ctx.last_fed_at = now;
        self.fsm.start(&mut self.ctx);
        self.arm_periodics(now);
        self.started = true;

        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("PetService started at {}ms in {:?}", now, self.fsm.current_state());
        self.render(display);
    }

    // ── Inputs ────────────────────────────────────────────────

    /// An item button was clicked.
    pub fn press(
        &mut self,
        now: Millis,
        label: &str,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        if !self.ensure_started() {
            return;
        }
        self.pump(now, display, sink);

        self.stats.manual_presses += 1;
        let event = if self.ctx.config.is_food(label) {
            info!("Button '{}' → fed", label);
            PetEvent::ManualFed
        } else {
            info!("Button '{}' → not food", label);
            PetEvent::ManualOther(label.to_owned())
        };
        self.post(now, event, sink);
        self.pump(now, display, sink);
    }

    /// Classifier output for one frame.
    ///
    /// An empty list is a quiet tick.  Any invalid probability skips the
    /// whole tick as an inference failure.
    pub fn observe(
        &mut self,
        now: Millis,
        predictions: &[ConfidenceSample],
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        if !self.ensure_started() {
            return;
        }
        self.pump(now, display, sink);

        if predictions.iter().any(|p| !p.is_valid()) {
            self.inference_failed(now, InferenceError::InvalidOutput, sink);
            return;
        }
        self.stats.frames_classified += 1;

        if self.ctx.config.sample_all_labels {
            for sample in predictions {
                self.sample(now, sample, sink);
            }
        } else if let Some(top) = top_prediction(predictions) {
            self.sample(now, top, sink);
        }

        self.pump(now, display, sink);
    }

    /// A classification tick failed.  State is left untouched.
    pub fn inference_failed(&mut self, now: Millis, error: InferenceError, sink: &mut impl EventSink) {
        self.stats.inference_failures += 1;
        warn!("Predict error at {}ms: {}", now, error);
        sink.emit(&AppEvent::InferenceFailed(error));
    }

    /// A collaborator could not be initialised; keep running manual-only.
    pub fn report_init_failure(
        &mut self,
        failure: InitFailure,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        warn!("Init failed: {}; automatic detection disabled", failure);
        if failure == InitFailure::ClassifierUnavailable {
            self.ctx.set_status(StatusMessage::ModelUnavailable);
        }
        sink.emit(&AppEvent::InitFailed(failure));
        self.render(display);
    }

    /// Fire every timer due at or before `now` and drain the queue.
    pub fn advance(&mut self, now: Millis, display: &mut impl DisplayPort, sink: &mut impl EventSink) {
        if !self.ensure_started() {
            return;
        }
        self.pump(now, display, sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        now: Millis,
        cmd: AppCommand,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::Press(label) => self.press(now, &label, display, sink),
            AppCommand::UpdateConfig(new_config) => {
                if let Err(e) = new_config.validate() {
                    warn!("Configuration rejected: {}", e);
                    return;
                }
                if self.started {
                    self.pump(now, display, sink);
                }
                let timers_changed = new_config.hunger_check_interval_ms
                    != self.ctx.config.hunger_check_interval_ms
                    || new_config.telemetry_interval_ms != self.ctx.config.telemetry_interval_ms;
                self.smoother.reconfigure(&new_config);
                self.ctx.config = new_config;
                if timers_changed && self.started {
                    self.arm_periodics(now);
                }
                info!("Configuration updated at runtime");
            }
            AppCommand::ForceState(target) => {
                if !self.ensure_started() {
                    return;
                }
                self.pump(now, display, sink);
                self.run(now, false, sink, |fsm, ctx| fsm.force_transition(target, ctx));
                self.pump(now, display, sink);
            }
            AppCommand::EmitTelemetry => {
                if self.started {
                    self.pump(now, display, sink);
                }
                self.emit_telemetry(now, sink);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot as of `now`.
    pub fn build_telemetry(&self, now: Millis) -> SessionTelemetry {
        let now = now.max(self.ctx.now_ms);
        SessionTelemetry {
            state: self.fsm.current_state(),
            ms_in_state: self.fsm.ms_in_current_state(now),
            overlay_visible: self.ctx.overlay_visible,
            since_fed_ms: now.saturating_sub(self.ctx.last_fed_at),
            pending_detection_ms: self
                .ctx
                .pending_detection_since
                .map(|since| now.saturating_sub(since)),
            tracked_labels: self.smoother.tracked_labels(),
            frames_classified: self.stats.frames_classified,
            inference_failures: self.stats.inference_failures,
            feedings: self.ctx.feedings,
            manual_presses: self.stats.manual_presses,
            events_dropped: self.queue.dropped(),
        }
    }

    /// Current FSM state (and eyes image).
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// What the display should show right now.
    pub fn view(&self) -> DisplayView {
        DisplayView {
            image: self.ctx.display.image,
            status: self.ctx.display.status.clone(),
            overlay_visible: self.ctx.overlay_visible,
        }
    }

    pub fn last_fed_at(&self) -> Millis {
        self.ctx.last_fed_at
    }

    pub fn pending_detection_since(&self) -> Option<Millis> {
        self.ctx.pending_detection_since
    }

    pub fn overlay_visible(&self) -> bool {
        self.ctx.overlay_visible
    }

    pub fn feedings(&self) -> u64 {
        self.ctx.feedings
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Rolling-average confidence for `label`, if tracked.
    pub fn label_average(&self, label: &str) -> Option<f32> {
        self.smoother.average(label)
    }

    /// Clone of the live configuration.
    pub fn current_config(&self) -> PetConfig {
        self.ctx.config.clone()
    }

    // ── Internal ──────────────────────────────────────────────

    fn ensure_started(&self) -> bool {
        if !self.started {
            warn!("PetService used before start(); input ignored");
        }
        self.started
    }

    fn arm_periodics(&mut self, now: Millis) {
        self.scheduler.add(
            Schedule {
                label: HUNGER_CHECK,
                kind: ScheduleKind::Periodic {
                    interval_ms: self.ctx.config.hunger_check_interval_ms,
                },
                action: ScheduleAction::HungerCheck,
            },
            now,
        );
        self.scheduler.add(
            Schedule {
                label: TELEMETRY,
                kind: ScheduleKind::Periodic {
                    interval_ms: self.ctx.config.telemetry_interval_ms,
                },
                action: ScheduleAction::Telemetry,
            },
            now,
        );
    }

    fn sample(&mut self, now: Millis, sample: &ConfidenceSample, sink: &mut impl EventSink) {
        if let Some(signal) = self.smoother.observe(sample) {
            self.post(now, PetEvent::Stable(signal), sink);
        }
    }

    fn post(&mut self, at: Millis, event: PetEvent, sink: &mut impl EventSink) {
        if !self.queue.push(at, event) {
            sink.emit(&AppEvent::EventDropped);
        }
    }

    /// Drain queued events, interleaving timer fires due at or before `now`.
    fn pump(&mut self, now: Millis, display: &mut impl DisplayPort, sink: &mut impl EventSink) {
        loop {
            if let Some(queued) = self.queue.pop() {
                self.dispatch(queued, sink);
                continue;
            }

            let dropped_before = self.queue.dropped();
            let mut delegate = QueueDelegate {
                queue: &mut self.queue,
                telemetry_at: None,
            };
            let fired = self.scheduler.fire_next(now, &mut delegate);
            let telemetry_at = delegate.telemetry_at;

            if let Some(at) = telemetry_at {
                self.emit_telemetry(at, sink);
            }
            if self.queue.dropped() != dropped_before {
                sink.emit(&AppEvent::EventDropped);
            }
            if !fired {
                break;
            }
        }
        self.render(display);
    }

    fn dispatch(&mut self, queued: QueuedEvent, sink: &mut impl EventSink) {
        let QueuedEvent { at, event } = queued;
        let manual = matches!(event, PetEvent::ManualFed);
        self.run(at, manual, sink, |fsm, ctx| fsm.dispatch(&event, ctx));
    }

    /// Run one FSM step at `at` and report what it changed.
    fn run(
        &mut self,
        at: Millis,
        manual: bool,
        sink: &mut impl EventSink,
        step: impl FnOnce(&mut Fsm, &mut PetContext) -> Option<Transition>,
    ) {
        // The timeline never runs backwards.
        let at = at.max(self.ctx.now_ms);
        self.ctx.now_ms = at;

        let overlay_before = self.ctx.overlay_visible;
        let feedings_before = self.ctx.feedings;

        if let Some(Transition { from, to }) = step(&mut self.fsm, &mut self.ctx) {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
        if self.ctx.feedings != feedings_before {
            sink.emit(&AppEvent::Fed {
                at: self.ctx.last_fed_at,
                manual,
            });
        }
        if overlay_before && !self.ctx.overlay_visible {
            sink.emit(&AppEvent::OverlayDismissed { at });
        }

        let requests = core::mem::take(&mut self.ctx.timer_requests);
        for request in &requests {
            self.scheduler.add(
                Schedule {
                    label: request.reason.label(),
                    kind: ScheduleKind::OneShot {
                        delay_ms: request.delay_ms,
                    },
                    action: ScheduleAction::Settle {
                        token: request.token,
                        reason: request.reason,
                    },
                },
                at,
            );
        }
    }

    fn emit_telemetry(&self, at: Millis, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Telemetry(self.build_telemetry(at)));
    }

    fn render(&mut self, display: &mut impl DisplayPort) {
        let view = self.view();
        if self.last_view.as_ref() != Some(&view) {
            display.render(&view);
            self.last_view = Some(view);
        }
    }
}

/// Highest-probability prediction; the last one wins a tie.
fn top_prediction(predictions: &[ConfidenceSample]) -> Option<&ConfidenceSample> {
    predictions.iter().fold(None, |best, p| match best {
        Some(b) if b.probability > p.probability => Some(b),
        _ => Some(p),
    })
}
