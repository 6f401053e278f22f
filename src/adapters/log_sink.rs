//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (routed to stderr by the binary's subscriber).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | state={:?} ({}ms) | overlay={} | since_fed={}ms | pending={} | \
                     labels={} | frames={} failures={} | fed={} presses={} dropped={}",
                    t.state,
                    t.ms_in_state,
                    if t.overlay_visible { "on" } else { "off" },
                    t.since_fed_ms,
                    t.pending_detection_ms
                        .map_or_else(|| "-".to_owned(), |ms| format!("{ms}ms")),
                    t.tracked_labels,
                    t.frames_classified,
                    t.inference_failures,
                    t.feedings,
                    t.manual_presses,
                    t.events_dropped,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::Fed { at, manual } => {
                info!(
                    "FED   | at={}ms via {}",
                    at,
                    if *manual { "button" } else { "camera" }
                );
            }
            AppEvent::OverlayDismissed { at } => {
                info!("START | overlay dismissed at={}ms", at);
            }
            AppEvent::InferenceFailed(e) => {
                warn!("INFER | tick skipped: {}", e);
            }
            AppEvent::InitFailed(failure) => {
                warn!("INIT  | {}", failure);
            }
            AppEvent::EventDropped => {
                warn!("QUEUE | event dropped");
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
        }
    }
}
