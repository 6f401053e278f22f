//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌─────────┬───────────┬──────────┬────────────────────────┐ │
//! │  │ StateId │ on_enter  │ on_exit  │ on_event               │ │
//! │  ├─────────┼───────────┼──────────┼────────────────────────┤ │
//! │  │ Start   │ fn(ctx)   │ fn(ctx)  │ fn(ctx, ev)->Option<>  │ │
//! │  │ Neutral │ fn(ctx)   │ -        │ fn(ctx, ev)->Option<>  │ │
//! │  │ Happy   │ fn(ctx)   │ -        │ fn(ctx, ev)->Option<>  │ │
//! │  │ Sad     │ fn(ctx)   │ -        │ fn(ctx, ev)->Option<>  │ │
//! │  └─────────┴───────────┴──────────┴────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each dispatched [`PetEvent`] goes to `on_event` of the **current**
//! state.  If it returns `Some(next_id)`, the engine runs `on_exit` for
//! the current state, bumps the context epoch, then runs `on_enter` for
//! the next.  Returning the current state re-enters it; that is how a
//! second feeding restarts the happy hold.  All functions receive
//! `&mut PetContext`.

pub mod context;
pub mod states;

use context::{Millis, PetContext, SettleReason};
use log::info;

use crate::smoother::StableSignal;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all pet states.  Each state has exactly one eyes image.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Start = 0,
    Neutral = 1,
    Happy = 2,
    Sad = 3,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Neutral` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Start,
            1 => Self::Neutral,
            2 => Self::Happy,
            3 => Self::Sad,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Neutral
            }
        }
    }

    /// Asset name of the eyes image for this state.
    pub fn image_name(self) -> &'static str {
        match self {
            Self::Start => "eyes_start",
            Self::Neutral => "eyes_neutral",
            Self::Happy => "eyes_happy",
            Self::Sad => "eyes_sad",
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Everything the state machine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum PetEvent {
    /// Button press on the food item.
    ManualFed,
    /// Button press on any other item.
    ManualOther(String),
    /// Smoothed classifier output above threshold.
    Stable(StableSignal),
    /// Periodic hunger deadline check.
    HungerTick,
    /// Deferred settle scheduled by a feeding or a manual sighting.
    Settle { token: u64, reason: SettleReason },
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut PetContext);

/// Signature for the per-event handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateEventFn = fn(&mut PetContext, &PetEvent) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_event: StateEventFn,
}

/// A completed transition, reported back to the caller of `dispatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Time at which the current state was entered.
    entered_at: Millis,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            entered_at: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `dispatch()`.
    pub fn start(&mut self, ctx: &mut PetContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        self.entered_at = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Hand one event to the current state.
    pub fn dispatch(&mut self, event: &PetEvent, ctx: &mut PetContext) -> Option<Transition> {
        let next = (self.table[self.current].on_event)(ctx, event)?;
        Some(self.transition(next, ctx))
    }

    /// Force an immediate transition, skipped when already in `next`.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut PetContext) -> Option<Transition> {
        (next as usize != self.current).then(|| self.transition(next, ctx))
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// How long the FSM has been in the current state at `now_ms`.
    pub fn ms_in_current_state(&self, now_ms: Millis) -> Millis {
        now_ms.saturating_sub(self.entered_at)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut PetContext) -> Transition {
        let from = self.current_state();
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.entered_at = ctx.now_ms;
        ctx.bump_epoch();

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }

        Transition { from, to: next_id }
    }
}
