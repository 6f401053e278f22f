//! Outbound application events.
//!
//! The [`PetService`](super::service::PetService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::error::{InferenceError, InitFailure};
use crate::fsm::StateId;
use crate::fsm::context::Millis;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries initial state).
    Started(StateId),

    /// The FSM moved between states (re-entries included).
    StateChanged { from: StateId, to: StateId },

    /// A feeding action ran.  `manual` is `true` for button presses.
    Fed { at: Millis, manual: bool },

    /// The start overlay went away.
    OverlayDismissed { at: Millis },

    /// One classification tick was skipped.
    InferenceFailed(InferenceError),

    /// A collaborator failed to initialise; detection runs degraded.
    InitFailed(InitFailure),

    /// The event queue was full and an event was lost.
    EventDropped,

    /// Periodic telemetry snapshot.
    Telemetry(SessionTelemetry),
}

/// A point-in-time telemetry snapshot suitable for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTelemetry {
    pub state: StateId,
    pub ms_in_state: Millis,
    pub overlay_visible: bool,
    pub since_fed_ms: Millis,
    /// How long the current food detection run has lasted, if any.
    pub pending_detection_ms: Option<Millis>,
    pub tracked_labels: usize,
    pub frames_classified: u64,
    pub inference_failures: u64,
    pub feedings: u64,
    pub manual_presses: u64,
    pub events_dropped: u64,
}
