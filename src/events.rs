//! Serialised event queue.
//!
//! Events are produced by:
//! - Manual button presses
//! - The classification smoother (stable signals)
//! - Scheduler fires (hunger check, deferred settles)
//!
//! and consumed one at a time, in FIFO order, by
//! [`PetService`](crate::app::service::PetService).  No handler ever runs
//! while another is in progress.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Buttons     │────▶│              │     │              │
//! │ Smoother    │────▶│  EventQueue  │────▶│  PetService  │
//! │ Scheduler   │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use heapless::Deque;
use log::warn;

use crate::fsm::PetEvent;
use crate::fsm::context::Millis;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 16;

/// An event stamped with the time it takes effect.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
    pub at: Millis,
    pub event: PetEvent,
}

/// Bounded FIFO of pending events.
pub struct EventQueue {
    buf: Deque<QueuedEvent, EVENT_QUEUE_CAP>,
    dropped: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            buf: Deque::new(),
            dropped: 0,
        }
    }

    /// Push an event into the queue.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&mut self, at: Millis, event: PetEvent) -> bool {
        match self.buf.push_back(QueuedEvent { at, event }) {
            Ok(()) => true,
            Err(rejected) => {
                self.dropped += 1;
                warn!("Event queue full, dropping {:?}", rejected.event);
                false
            }
        }
    }

    /// Pop the next event.  Returns `None` if the queue is empty.
    pub fn pop(&mut self) -> Option<QueuedEvent> {
        self.buf.pop_front()
    }

    /// Events rejected because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
