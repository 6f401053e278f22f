//! Concrete state handler functions and table builder.
//!
//! ```text
//!  START ──[fed]──────────────▶ HAPPY ◀──[fed]── any state
//!    │                            │
//!    │                  [hold settle, not hungry]
//!    │                            ▼
//!    └──[sighting settle]────▶ NEUTRAL
//!
//!  any state ──[hunger deadline]──▶ SAD ──[fed]──▶ HAPPY
//! ```
//!
//! Entering `Happy` *is* the feeding action: it stamps `last_fed_at`,
//! clears the pending detection run and asks for the display-hold settle.
//! Deferred settles recompute hunger from `last_fed_at` when they fire, so
//! a settle and a hunger tick agree regardless of which runs last.

use super::context::{PetContext, SettleReason, StatusMessage};
use super::{PetEvent, StateDescriptor, StateId};
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Start
        StateDescriptor {
            id: StateId::Start,
            name: "Start",
            on_enter: Some(start_enter),
            on_exit: Some(start_exit),
            on_event: react,
        },
        // Index 1: Neutral
        StateDescriptor {
            id: StateId::Neutral,
            name: "Neutral",
            on_enter: Some(neutral_enter),
            on_exit: None,
            on_event: react,
        },
        // Index 2: Happy
        StateDescriptor {
            id: StateId::Happy,
            name: "Happy",
            on_enter: Some(happy_enter),
            on_exit: None,
            on_event: react,
        },
        // Index 3: Sad
        StateDescriptor {
            id: StateId::Sad,
            name: "Sad",
            on_enter: Some(sad_enter),
            on_exit: None,
            on_event: sad_event,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  START: greeting screen behind the overlay
// ═══════════════════════════════════════════════════════════════════════════

fn start_enter(ctx: &mut PetContext) {
    ctx.display.image = StateId::Start;
    ctx.set_status(StatusMessage::Greeting);
}

fn start_exit(_ctx: &mut PetContext) {
    info!("Start screen left");
}

// ═══════════════════════════════════════════════════════════════════════════
//  NEUTRAL: waiting for food
// ═══════════════════════════════════════════════════════════════════════════

fn neutral_enter(ctx: &mut PetContext) {
    ctx.display.image = StateId::Neutral;
    ctx.pending_detection_since = None;
    ctx.set_status(StatusMessage::Waiting);
}

// ═══════════════════════════════════════════════════════════════════════════
//  HAPPY: just fed, held for `display_hold_ms`
// ═══════════════════════════════════════════════════════════════════════════

fn happy_enter(ctx: &mut PetContext) {
    ctx.display.image = StateId::Happy;
    ctx.set_status(StatusMessage::Thanks);
    ctx.mark_fed();
    ctx.pending_detection_since = None;
    ctx.request_settle(SettleReason::AfterFeeding, ctx.config.display_hold_ms);
    info!("Fed at {}ms (feeding #{})", ctx.last_fed_at, ctx.feedings);
}

// ═══════════════════════════════════════════════════════════════════════════
//  SAD: hunger deadline passed
// ═══════════════════════════════════════════════════════════════════════════

fn sad_enter(ctx: &mut PetContext) {
    ctx.display.image = StateId::Sad;
    ctx.set_status(StatusMessage::MissingFood);
    info!("Hungry: {}ms since last feeding", ctx.since_fed_ms());
}

fn sad_event(ctx: &mut PetContext, event: &PetEvent) -> Option<StateId> {
    match event {
        // Already showing the sad face; nothing to redraw.
        PetEvent::HungerTick => None,
        _ => react(ctx, event),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared event handling
// ═══════════════════════════════════════════════════════════════════════════

fn react(ctx: &mut PetContext, event: &PetEvent) -> Option<StateId> {
    match event {
        PetEvent::ManualFed => {
            if ctx.dismiss_overlay() {
                info!("Overlay dismissed by manual feeding");
            }
            Some(StateId::Happy)
        }

        PetEvent::ManualOther(label) => {
            ctx.set_status(StatusMessage::NotFood {
                label: label.clone(),
            });
            ctx.bump_sighting_epoch();
            ctx.request_settle(SettleReason::AfterSighting, ctx.config.manual_revert_ms);
            None
        }

        PetEvent::Stable(signal) => {
            if signal.avg >= ctx.config.confidence_threshold && ctx.dismiss_overlay() {
                info!("Overlay dismissed by stable '{}'", signal.label);
            }

            if ctx.config.is_food(&signal.label) {
                let now = ctx.now_ms;
                let since = *ctx.pending_detection_since.get_or_insert(now);
                if now.saturating_sub(since) >= ctx.config.hold_time_ms {
                    ctx.pending_detection_since = None;
                    return Some(StateId::Happy);
                }
                None
            } else {
                ctx.set_status(StatusMessage::Seen {
                    label: signal.label.clone(),
                    avg: signal.avg,
                });
                if ctx.config.non_food_resets_hold {
                    ctx.pending_detection_since = Some(ctx.now_ms);
                }
                None
            }
        }

        PetEvent::HungerTick => {
            (ctx.is_hungry() && ctx.display.image != StateId::Sad).then_some(StateId::Sad)
        }

        PetEvent::Settle { token, reason } => {
            if !ctx.is_current(*reason, *token) {
                debug!("Settle {:?} superseded (token {})", reason, token);
                return None;
            }
            if ctx.is_hungry() {
                if ctx.display.image == StateId::Sad {
                    ctx.set_status(StatusMessage::MissingFood);
                    return None;
                }
                Some(StateId::Sad)
            } else {
                Some(StateId::Neutral)
            }
        }
    }
}
