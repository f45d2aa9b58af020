//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  IDLE ──[Granted]──▶ AWAITING_PRESENCE ──[hand]──▶ DISPENSING
//!    ▲                        │                          │
//!    └──────[timeout]─────────┘                          │
//!    └──────────────────[duration elapsed]───────────────┘
//! ```
//!
//! The valve is commanded open only in `dispensing_enter` and closed in
//! `dispensing_exit`, so every way out of `Dispensing` closes it.

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use crate::credential::Verdict;
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: AwaitingPresence
        StateDescriptor {
            id: StateId::AwaitingPresence,
            name: "AwaitingPresence",
            on_enter: Some(awaiting_enter),
            on_exit: None,
            on_update: awaiting_update,
        },
        // Index 2: Dispensing
        StateDescriptor {
            id: StateId::Dispensing,
            name: "Dispensing",
            on_enter: Some(dispensing_enter),
            on_exit: Some(dispensing_exit),
            on_update: dispensing_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE: scanning for credentials
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.commands.valve_open = false;
    ctx.inputs = Default::default();
    info!("IDLE: scanning for credentials");
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.inputs.verdict.take() {
        Some(Verdict::Granted) => Some(StateId::AwaitingPresence),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAITING_PRESENCE: access granted, waiting for a hand
// ═══════════════════════════════════════════════════════════════════════════

fn awaiting_enter(ctx: &mut FsmContext) {
    ctx.inputs.presence = None;
    info!(
        "AWAITING_PRESENCE: up to {}s for a hand within {:.0} cm",
        ctx.config.presence_wait_secs, ctx.config.presence_threshold_cm
    );
}

fn awaiting_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.inputs.presence.take() {
        Some(true) => Some(StateId::Dispensing),
        Some(false) => Some(StateId::Idle),
        None => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISPENSING: valve open for a fixed duration
// ═══════════════════════════════════════════════════════════════════════════

fn dispensing_enter(ctx: &mut FsmContext) {
    ctx.session.active = true;
    ctx.session.start_ms = ctx.now_ms;
    ctx.commands.valve_open = true;
    info!(
        "DISPENSING: valve open for {}s",
        ctx.config.session_duration_secs
    );
}

fn dispensing_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.session_elapsed_ms() >= ctx.config.session_duration_ms() {
        return Some(StateId::Idle);
    }
    None
}

fn dispensing_exit(ctx: &mut FsmContext) {
    ctx.commands.valve_open = false;
    ctx.session.active = false;
    info!(
        "DISPENSING: valve closed after {} ms",
        ctx.now_ms.saturating_sub(ctx.session.start_ms)
    );
}
