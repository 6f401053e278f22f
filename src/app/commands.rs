//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (buttons, the
//! console, a config reload) that the
//! [`PetService`](super::service::PetService) interprets and acts upon.

use crate::config::PetConfig;
use crate::fsm::StateId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// An item button was clicked; carries the item's label.
    Press(String),

    /// Hot-reload configuration.  Rejected if it fails validation.
    UpdateConfig(PetConfig),

    /// Force the FSM into a specific state (debug / testing only).
    ForceState(StateId),

    /// Emit a telemetry snapshot right away.
    EmitTelemetry,
}
