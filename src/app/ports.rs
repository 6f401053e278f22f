//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PetService (domain)
//! ```
//!
//! The camera, the classifier, the display and the event sink are all
//! driven through these traits.  [`PetService`](super::service::PetService)
//! and [`Detector`](super::detector::Detector) consume them via generics,
//! so the domain core never touches a real webcam, model or screen.

use crate::config::PetConfig;
use crate::error::InferenceError;
use crate::fsm::StateId;
use crate::fsm::context::{Millis, StatusMessage};
use crate::scheduler::ScheduleAction;
use crate::smoother::ConfidenceSample;

// ───────────────────────────────────────────────────────────────
// Camera port (driven adapter: webcam → domain)
// ───────────────────────────────────────────────────────────────

/// One captured video frame.  Opaque to the core; only the classifier
/// looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Packed RGBA8 pixels, row-major.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// A black frame of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }
}

/// Frame source.  `update` refreshes the buffer once per tick.
pub trait CameraPort {
    fn update(&mut self) -> Result<&Frame, InferenceError>;
}

// ───────────────────────────────────────────────────────────────
// Classifier port (driven adapter: model → domain)
// ───────────────────────────────────────────────────────────────

/// Image classifier.  Returns `(label, probability)` pairs in the model's
/// class order; the core picks what it needs.
pub trait ClassifierPort {
    fn predict(&mut self, frame: &Frame) -> Result<Vec<ConfidenceSample>, InferenceError>;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → screen)
// ───────────────────────────────────────────────────────────────

/// Everything the display surface shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayView {
    pub image: StateId,
    pub status: StatusMessage,
    pub overlay_visible: bool,
}

/// Render-side port.  Called only when the view changed.
pub trait DisplayPort {
    fn render(&mut self, view: &DisplayView);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait TimePort {
    fn now_ms(&self) -> Millis;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ config file)
// ───────────────────────────────────────────────────────────────

/// Loads and persists configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`], never clamp silently.
pub trait ConfigPort {
    /// Load configuration.  Returns [`PetConfig::default()`] if nothing is
    /// stored yet.
    fn load(&self) -> Result<PetConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &PetConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from event queue)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a schedule fires.
///
/// The service implements this by pushing the matching event into its
/// queue; the [`Scheduler`](crate::scheduler::Scheduler) itself knows
/// nothing about events or the state machine.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, fired: &ScheduleFired);
}

/// Notification passed to [`SchedulerDelegate::on_schedule_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleFired {
    pub label: &'static str,
    pub kind: ScheduleFiredKind,
    pub action: ScheduleAction,
    /// When the schedule was due; the event takes effect at this time.
    pub due_ms: Millis,
}

/// Discriminant carried by [`ScheduleFired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    /// A recurring periodic schedule fired.
    Periodic,
    /// A one-shot schedule fired (removed after).
    OneShot,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage.
    NotFound,
    /// Stored config failed to deserialize.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
