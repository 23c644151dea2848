//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers, with no closures
//! and no heap.
//!
//! ```text
//!  IDLE ──[path assigned]──▶ FORWARD ◀──▶ SOFT_* / HARD_*
//!                               │  ▲               │
//!                    [intersection]│               └─[no line]──▶ OFF_LINE
//!                               ▼  │
//!                  INTERSECTION_DETECTED ──[End / exhausted]──▶ ARRIVED
//!                     │        │      │
//!               [1/2/3]│    [4]│   [bad digit]──▶ stop, settle again
//!                     ▼        ▼
//!            EXECUTING_*    PASSING_STRAIGHT ──[pass done]──▶ line resolution
//!                     │
//!           [line locked]──▶ line resolution
//!           [deadline]───▶ OFF_LINE
//! ```
//!
//! The executing states never block: each tick checks the phase timer
//! or polls the sensors once and returns.

use super::context::{
    Motion, NavContext, NavNotice, ReacquireStage, TurnKind, TurnPhase, TurnProgress,
    NODE_ARRIVED,
};
use super::line::{detect_intersection, line_locked, resolve_line};
use super::path::{PathCommand, PathStep};
use super::{RobotState, StateDescriptor};
use log::{error, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; RobotState::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: RobotState::Idle,
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: hold_update,
        },
        // Index 1: Forward
        StateDescriptor {
            id: RobotState::Forward,
            on_enter: Some(forward_enter),
            on_exit: None,
            on_update: line_update,
        },
        // Index 2: SoftLeft
        StateDescriptor {
            id: RobotState::SoftLeft,
            on_enter: Some(soft_left_enter),
            on_exit: None,
            on_update: line_update,
        },
        // Index 3: SoftRight
        StateDescriptor {
            id: RobotState::SoftRight,
            on_enter: Some(soft_right_enter),
            on_exit: None,
            on_update: line_update,
        },
        // Index 4: HardLeft
        StateDescriptor {
            id: RobotState::HardLeft,
            on_enter: Some(hard_left_enter),
            on_exit: None,
            on_update: line_update,
        },
        // Index 5: HardRight
        StateDescriptor {
            id: RobotState::HardRight,
            on_enter: Some(hard_right_enter),
            on_exit: None,
            on_update: line_update,
        },
        // Index 6: IntersectionDetected
        StateDescriptor {
            id: RobotState::IntersectionDetected,
            on_enter: Some(intersection_enter),
            on_exit: None,
            on_update: intersection_update,
        },
        // Index 7: ExecutingLeft
        StateDescriptor {
            id: RobotState::ExecutingLeft,
            on_enter: Some(executing_left_enter),
            on_exit: Some(executing_exit),
            on_update: executing_update,
        },
        // Index 8: ExecutingRight
        StateDescriptor {
            id: RobotState::ExecutingRight,
            on_enter: Some(executing_right_enter),
            on_exit: Some(executing_exit),
            on_update: executing_update,
        },
        // Index 9: ExecutingUTurn
        StateDescriptor {
            id: RobotState::ExecutingUTurn,
            on_enter: Some(executing_u_turn_enter),
            on_exit: Some(executing_exit),
            on_update: executing_update,
        },
        // Index 10: PassingStraight
        StateDescriptor {
            id: RobotState::PassingStraight,
            on_enter: Some(passing_straight_enter),
            on_exit: None,
            on_update: passing_straight_update,
        },
        // Index 11: Arrived
        StateDescriptor {
            id: RobotState::Arrived,
            on_enter: Some(arrived_enter),
            on_exit: None,
            on_update: hold_update,
        },
        // Index 12: OffLine
        StateDescriptor {
            id: RobotState::OffLine,
            on_enter: Some(off_line_enter),
            on_exit: None,
            on_update: hold_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE / ARRIVED / OFF_LINE: stopped until a new path is assigned
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut NavContext) {
    ctx.motion = Motion::Stop;
    ctx.turn = None;
    ctx.route.halt();
    info!("IDLE: waiting for a path");
}

fn arrived_enter(ctx: &mut NavContext) {
    ctx.motion = Motion::Stop;
    ctx.route.halt();
    ctx.set_node(NODE_ARRIVED);
    info!(
        "ARRIVED: path complete after {} step(s)",
        ctx.route.cursor()
    );
}

fn off_line_enter(ctx: &mut NavContext) {
    ctx.motion = Motion::Stop;
    ctx.route.halt();
    warn!(
        "OFF_LINE: line lost at step {}, waiting for a new path",
        ctx.route.cursor()
    );
}

fn hold_update(_ctx: &mut NavContext) -> Option<RobotState> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  Line following: FORWARD, SOFT_*, HARD_*
// ═══════════════════════════════════════════════════════════════════════════

fn forward_enter(ctx: &mut NavContext) {
    ctx.motion = Motion::Forward;
}

fn soft_left_enter(ctx: &mut NavContext) {
    ctx.motion = Motion::SoftLeft;
}

fn soft_right_enter(ctx: &mut NavContext) {
    ctx.motion = Motion::SoftRight;
}

fn hard_left_enter(ctx: &mut NavContext) {
    ctx.motion = Motion::HardLeft;
}

fn hard_right_enter(ctx: &mut NavContext) {
    ctx.motion = Motion::HardRight;
}

/// Shared by all five line-following states.  Intersection detection
/// takes precedence over line resolution.
fn line_update(ctx: &mut NavContext) -> Option<RobotState> {
    if detect_intersection(&ctx.sensors) {
        return Some(RobotState::IntersectionDetected);
    }
    Some(resolve_line(&ctx.sensors))
}

// ═══════════════════════════════════════════════════════════════════════════
//  INTERSECTION_DETECTED: settle, then dispatch the step at the cursor
// ═══════════════════════════════════════════════════════════════════════════

fn intersection_enter(ctx: &mut NavContext) {
    ctx.motion = Motion::Stop;
    ctx.settle_started_ms = ctx.now_ms;
    ctx.set_node_for_cursor();
    info!(
        "INTERSECTION: reached {}, settling for {} ms",
        ctx.node, ctx.config.settle_ms
    );
}

fn intersection_update(ctx: &mut NavContext) -> Option<RobotState> {
    if ctx.ms_settling() < u64::from(ctx.config.settle_ms) {
        return None;
    }

    let index = ctx.route.cursor();
    let step = ctx.route.current();
    // The cursor moves on whatever the step turns out to be.
    ctx.route.advance();

    match step {
        None | Some(PathStep::Command(PathCommand::End)) => Some(RobotState::Arrived),
        Some(PathStep::Command(PathCommand::Left)) => Some(RobotState::ExecutingLeft),
        Some(PathStep::Command(PathCommand::Right)) => Some(RobotState::ExecutingRight),
        Some(PathStep::Command(PathCommand::UTurn)) => Some(RobotState::ExecutingUTurn),
        Some(PathStep::Command(PathCommand::Straight)) => Some(RobotState::PassingStraight),
        Some(PathStep::Malformed(code)) => {
            error!(
                "INTERSECTION: malformed path step {:?} at index {}, skipping",
                code, index
            );
            ctx.notify(NavNotice::MalformedStep { index, code });
            // Still on the cross: hold still and dispatch the next step
            // after a fresh settle.
            ctx.motion = Motion::Stop;
            ctx.settle_started_ms = ctx.now_ms;
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  EXECUTING_LEFT / EXECUTING_RIGHT / EXECUTING_UTURN
//
//  Creep ──[creep_ms]──▶ Commit ──[turn_commit_ms]──▶ Reacquire
//
//  Reacquire is a polled sub-state bounded by `reacquire_timeout_ms`.
// ═══════════════════════════════════════════════════════════════════════════

fn begin_turn(ctx: &mut NavContext, kind: TurnKind) {
    ctx.turn = Some(TurnProgress::new(kind, ctx.now_ms));
    ctx.motion = Motion::Forward;
    info!("TURN {:?}: creeping into the intersection", kind);
}

fn executing_left_enter(ctx: &mut NavContext) {
    begin_turn(ctx, TurnKind::Left);
}

fn executing_right_enter(ctx: &mut NavContext) {
    begin_turn(ctx, TurnKind::Right);
}

fn executing_u_turn_enter(ctx: &mut NavContext) {
    begin_turn(ctx, TurnKind::UTurn);
}

fn executing_exit(ctx: &mut NavContext) {
    ctx.turn = None;
}

fn enter_phase(ctx: &mut NavContext, phase: TurnPhase) {
    if let Some(turn) = ctx.turn.as_mut() {
        turn.phase = phase;
        turn.phase_started_ms = ctx.now_ms;
    }
}

fn executing_update(ctx: &mut NavContext) -> Option<RobotState> {
    let Some(turn) = ctx.turn else {
        // Entered without a turn record: fall back to line following.
        return Some(resolve_line(&ctx.sensors));
    };
    let elapsed = ctx.ms_in_phase();

    match turn.phase {
        TurnPhase::Creep => {
            if elapsed >= u64::from(ctx.config.creep_ms) {
                enter_phase(ctx, TurnPhase::Commit);
                ctx.motion = turn.kind.motion();
            }
            None
        }
        TurnPhase::Commit => {
            if elapsed >= u64::from(ctx.config.turn_commit_ms) {
                let first = match turn.kind {
                    TurnKind::UTurn => ReacquireStage::CrossStaleLine,
                    TurnKind::Left | TurnKind::Right => ReacquireStage::LockLine,
                };
                enter_phase(ctx, TurnPhase::Reacquire(first));
            }
            None
        }
        TurnPhase::Reacquire(stage) => reacquire(ctx, turn.kind, stage),
    }
}

fn reacquire(ctx: &mut NavContext, kind: TurnKind, stage: ReacquireStage) -> Option<RobotState> {
    let s = ctx.sensors;
    match stage {
        ReacquireStage::CrossStaleLine => {
            if s.center || s.right {
                set_stage(ctx, ReacquireStage::ClearStaleLine);
            }
        }
        ReacquireStage::ClearStaleLine => {
            if s.none_active() {
                set_stage(ctx, ReacquireStage::LockLine);
            }
        }
        ReacquireStage::LockLine => {
            if line_locked(&s) {
                info!("TURN {:?}: line reacquired", kind);
                return Some(resolve_line(&s));
            }
        }
    }

    if ctx.ms_in_phase() >= u64::from(ctx.config.reacquire_timeout_ms) {
        error!(
            "TURN {:?}: line not reacquired within {} ms",
            kind, ctx.config.reacquire_timeout_ms
        );
        ctx.notify(NavNotice::ReacquireTimeout { kind });
        return Some(RobotState::OffLine);
    }
    None
}

/// Stage changes leave `phase_started_ms` alone so the deadline covers
/// the whole reacquire phase.
fn set_stage(ctx: &mut NavContext, stage: ReacquireStage) {
    if let Some(turn) = ctx.turn.as_mut() {
        turn.phase = TurnPhase::Reacquire(stage);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  PASSING_STRAIGHT: timed forward pass, intersection detection off
// ═══════════════════════════════════════════════════════════════════════════

fn passing_straight_enter(ctx: &mut NavContext) {
    ctx.motion = Motion::Forward;
    info!(
        "STRAIGHT: passing {} for {} ms",
        ctx.node, ctx.config.straight_pass_ms
    );
}

fn passing_straight_update(ctx: &mut NavContext) -> Option<RobotState> {
    if ctx.ms_in_state < u64::from(ctx.config.straight_pass_ms) {
        return None;
    }
    Some(resolve_line(&ctx.sensors))
}
