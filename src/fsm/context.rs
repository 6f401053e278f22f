//! Shared mutable context threaded through every FSM handler.
//!
//! `PetContext` is the single struct that state handlers read from and
//! write to: the feeding clock, the pending detection run, the overlay
//! flag, the display output and the epoch that guards deferred settles.
//! Think of it as the "blackboard" in a blackboard architecture.

use core::fmt;

use heapless::Vec as HVec;

use super::StateId;
use crate::config::PetConfig;

/// Milliseconds on the session's monotonic timeline.
pub type Millis = u64;

/// Maximum deferred settles a single dispatch may request.
const MAX_TIMER_REQUESTS: usize = 4;

// ---------------------------------------------------------------------------
// Display output (written by state handlers; rendered by the service)
// ---------------------------------------------------------------------------

/// Status line shown under the eyes.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusMessage {
    /// Start screen greeting.
    Greeting,
    /// Just fed.
    Thanks,
    /// Neutral, nothing going on.
    Waiting,
    /// Stable non-food detection, with its rolling-average confidence.
    Seen { label: String, avg: f32 },
    /// Manual press on a non-food item.
    NotFood { label: String },
    /// Hunger deadline passed.
    MissingFood,
    /// Classifier failed to load; buttons still work.
    ModelUnavailable,
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greeting => write!(f, "Say hello!"),
            Self::Thanks => write!(f, "Thank you!"),
            Self::Waiting => write!(f, "Waiting..."),
            Self::Seen { label, avg } => write!(f, "Seen: {} ({:.0}%)", label, avg * 100.0),
            Self::NotFood { label } => write!(f, "Seen: {label} (not food)"),
            Self::MissingFood => write!(f, "I miss food..."),
            Self::ModelUnavailable => write!(f, "Model not loaded."),
        }
    }
}

/// What the display surface should currently show.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayCommands {
    /// Eyes image; one per state.
    pub image: StateId,
    pub status: StatusMessage,
}

impl Default for DisplayCommands {
    fn default() -> Self {
        Self {
            image: StateId::Start,
            status: StatusMessage::Greeting,
        }
    }
}

// ---------------------------------------------------------------------------
// Deferred settles (requested by handlers; scheduled by the service)
// ---------------------------------------------------------------------------

/// Why a deferred settle was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettleReason {
    /// End of the happy display hold after a feeding.
    AfterFeeding,
    /// End of a manual non-food sighting.
    AfterSighting,
}

impl SettleReason {
    /// Scheduler label; one pending settle per reason.
    pub fn label(self) -> &'static str {
        match self {
            Self::AfterFeeding => "settle-after-feeding",
            Self::AfterSighting => "settle-after-sighting",
        }
    }
}

/// A one-shot settle a handler wants fired `delay_ms` from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub reason: SettleReason,
    pub delay_ms: Millis,
    /// Epoch at request time; the settle is a no-op once this is stale.
    pub token: u64,
}

// ---------------------------------------------------------------------------
// PetContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct PetContext {
    // -- Timing --
    /// Timestamp of the event currently being handled.
    pub now_ms: Millis,
    /// Last feeding.  Only moves forward.
    pub last_fed_at: Millis,
    /// Start of the current run of stable food detections.
    pub pending_detection_since: Option<Millis>,

    // -- Presentation --
    /// Start overlay still covering the screen.
    pub overlay_visible: bool,
    /// Current display output.
    pub display: DisplayCommands,

    // -- Bookkeeping --
    /// Bumped on every transition.
    pub epoch: u64,
    /// Bumped on every transition and every manual sighting.
    pub sighting_epoch: u64,
    /// Feeding actions performed this session.
    pub feedings: u64,
    /// Settles requested during the current dispatch.
    pub timer_requests: HVec<TimerRequest, MAX_TIMER_REQUESTS>,

    // -- Configuration --
    pub config: PetConfig,
}

impl PetContext {
    /// Create a fresh context at `now_ms`, counting it as the last feeding.
    pub fn new(config: PetConfig, now_ms: Millis) -> Self {
        Self {
            now_ms,
            last_fed_at: now_ms,
            pending_detection_since: None,
            overlay_visible: true,
            display: DisplayCommands::default(),
            epoch: 0,
            sighting_epoch: 0,
            feedings: 0,
            timer_requests: HVec::new(),
            config,
        }
    }

    /// Milliseconds since the last feeding.
    pub fn since_fed_ms(&self) -> Millis {
        self.now_ms.saturating_sub(self.last_fed_at)
    }

    /// Hunger deadline reached.
    pub fn is_hungry(&self) -> bool {
        self.since_fed_ms() >= self.config.sad_after_ms
    }

    /// Record a feeding at the current time without moving backwards.
    pub fn mark_fed(&mut self) {
        self.last_fed_at = self.last_fed_at.max(self.now_ms);
        self.feedings += 1;
    }

    /// Invalidate every deferred settle scheduled so far.
    pub fn bump_epoch(&mut self) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.bump_sighting_epoch();
        self.epoch
    }

    /// Invalidate pending sighting reverts only.  A feeding hold keeps
    /// its token.
    pub fn bump_sighting_epoch(&mut self) -> u64 {
        self.sighting_epoch = self.sighting_epoch.wrapping_add(1);
        self.sighting_epoch
    }

    fn epoch_for(&self, reason: SettleReason) -> u64 {
        match reason {
            SettleReason::AfterFeeding => self.epoch,
            SettleReason::AfterSighting => self.sighting_epoch,
        }
    }

    /// `token` still refers to the current epoch for `reason`.
    pub fn is_current(&self, reason: SettleReason, token: u64) -> bool {
        token == self.epoch_for(reason)
    }

    /// Ask the service to fire a settle after `delay_ms`, tagged with the
    /// current epoch for `reason`.
    pub fn request_settle(&mut self, reason: SettleReason, delay_ms: Millis) {
        let request = TimerRequest {
            reason,
            delay_ms,
            token: self.epoch_for(reason),
        };
        if self.timer_requests.push(request).is_err() {
            log::warn!("FSM: timer request dropped ({:?})", reason);
        }
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        self.display.status = status;
    }

    /// Hide the start overlay.  Returns `true` if it was visible.
    pub fn dismiss_overlay(&mut self) -> bool {
        core::mem::replace(&mut self.overlay_visible, false)
    }
}
