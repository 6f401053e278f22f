//! Timer/scheduler engine.
//!
//! Periodic checks and deferred one-shots live on the same millisecond
//! timeline as every other event.  The scheduler notifies a
//! [`SchedulerDelegate`] when a schedule fires; the service implements the
//! delegate to push events into its queue.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Timer Sources                            │
//! │                                                              │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │ Hunger check│  │ Telemetry   │  │ Settle one-shots     │  │
//! │  │ (periodic)  │  │ (periodic)  │  │ (feeding / sighting) │  │
//! │  └──────┬──────┘  └──────┬──────┘  └──────────┬───────────┘  │
//! │         ▼                ▼                    ▼              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              SchedulerDelegate                         │  │
//! │  │         (service pushes into EventQueue)               │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Schedules are keyed by label: adding a schedule whose label is already
//! present replaces it, so at most one settle per reason is ever pending.

use heapless::Vec as HVec;
use log::{debug, info, warn};

use crate::app::ports::{ScheduleFired, ScheduleFiredKind, SchedulerDelegate};
use crate::fsm::context::{Millis, SettleReason};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single schedule entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// Unique label (e.g., "hunger-check").
    pub label: &'static str,
    /// Type of schedule.
    pub kind: ScheduleKind,
    /// What firing this schedule means.
    pub action: ScheduleAction,
}

/// The type of schedule determines how and when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// Fire every `interval_ms`, first fire one interval after adding.
    Periodic { interval_ms: Millis },
    /// Fire once after `delay_ms`, then drop out.
    OneShot { delay_ms: Millis },
}

/// Payload handed to the delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    HungerCheck,
    Telemetry,
    Settle { token: u64, reason: SettleReason },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 6;

/// The scheduler engine.
///
/// Decoupled from the event system: when a schedule fires, it invokes the
/// [`SchedulerDelegate`] rather than pushing events itself.
pub struct Scheduler {
    entries: HVec<ScheduleEntry, MAX_SCHEDULES>,
    /// Insertion counter; breaks ties between equal due times.
    seq: u64,
}

/// Internal bookkeeping for a live schedule.
#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    next_due: Millis,
    seq: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            entries: HVec::new(),
            seq: 0,
        }
    }

    /// Add a schedule at `now`, replacing any schedule with the same label.
    /// Returns `false` if all slots are taken.
    pub fn add(&mut self, schedule: Schedule, now: Millis) -> bool {
        let replaced = self.remove(schedule.label);

        let next_due = match schedule.kind {
            ScheduleKind::Periodic { interval_ms } => now.saturating_add(interval_ms.max(1)),
            ScheduleKind::OneShot { delay_ms } => now.saturating_add(delay_ms),
        };
        self.seq += 1;
        let label = schedule.label;
        let entry = ScheduleEntry {
            schedule,
            next_due,
            seq: self.seq,
        };
        if self.entries.push(entry).is_err() {
            warn!("Scheduler: no free slot for '{}'", label);
            return false;
        }
        if replaced {
            debug!("Scheduler: rescheduled '{}' for {}ms", label, next_due);
        } else {
            info!("Scheduler: added '{}' due at {}ms", label, next_due);
        }
        true
    }

    /// Remove a schedule by label.  Returns `true` if one was removed.
    pub fn remove(&mut self, label: &str) -> bool {
        match self.entries.iter().position(|e| e.schedule.label == label) {
            Some(idx) => {
                self.entries.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Fire the single earliest schedule due at or before `now`.
    ///
    /// Returns `false` when nothing is due.  Call repeatedly, handling the
    /// delegate's output in between, so fires interleave correctly with
    /// anything they schedule.
    pub fn fire_next(&mut self, now: Millis, delegate: &mut dyn SchedulerDelegate) -> bool {
        let Some(idx) = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.next_due <= now)
            .min_by_key(|(_, e)| (e.next_due, e.seq))
            .map(|(i, _)| i)
        else {
            return false;
        };

        let entry = &mut self.entries[idx];
        let due = entry.next_due;
        let kind = entry.schedule.kind;
        let fired = ScheduleFired {
            label: entry.schedule.label,
            kind: match kind {
                ScheduleKind::Periodic { .. } => ScheduleFiredKind::Periodic,
                ScheduleKind::OneShot { .. } => ScheduleFiredKind::OneShot,
            },
            action: entry.schedule.action,
            due_ms: due,
        };

        match kind {
            ScheduleKind::Periodic { interval_ms } => {
                entry.next_due = due.saturating_add(interval_ms.max(1));
            }
            ScheduleKind::OneShot { .. } => {
                self.entries.swap_remove(idx);
            }
        }

        delegate.on_schedule_fired(&fired);
        true
    }

    /// Number of live schedules.
    pub fn active_count(&self) -> usize {
        self.entries.len()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
