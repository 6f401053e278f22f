//! Unified error types for the PetPal core.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the event loop's error handling uniform.  All variants are `Copy` so
//! they can be passed through the service and event sink without
//! allocation.
//!
//! None of these errors is fatal: initialisation failures degrade the
//! session to manual-only input, inference failures skip one tick.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A collaborator could not be brought up at startup.
    Init(InitFailure),
    /// A single classification tick failed.
    Inference(InferenceError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Inference(e) => write!(f, "inference: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Initialisation failures
// ---------------------------------------------------------------------------

/// Startup failures of the external collaborators.
///
/// Reported once through
/// [`PetService::report_init_failure`](crate::app::service::PetService::report_init_failure);
/// the session keeps running with manual buttons only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitFailure {
    /// The camera could not be opened or started.
    CameraUnavailable,
    /// The classifier model could not be loaded.
    ClassifierUnavailable,
}

impl fmt::Display for InitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CameraUnavailable => write!(f, "camera unavailable"),
            Self::ClassifierUnavailable => write!(f, "classifier unavailable"),
        }
    }
}

impl From<InitFailure> for Error {
    fn from(e: InitFailure) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Inference failures
// ---------------------------------------------------------------------------

/// Per-tick failures on the automatic detection path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceError {
    /// The camera had no frame to hand out this tick.
    FrameUnavailable,
    /// The classifier returned a probability that is NaN or outside `[0, 1]`.
    InvalidOutput,
    /// The classifier backend reported an error.
    Backend(&'static str),
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameUnavailable => write!(f, "frame unavailable"),
            Self::InvalidOutput => write!(f, "invalid classifier output"),
            Self::Backend(msg) => write!(f, "backend: {msg}"),
        }
    }
}

impl From<InferenceError> for Error {
    fn from(e: InferenceError) -> Self {
        Self::Inference(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
