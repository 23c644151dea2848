//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                      │
//! │  ┌──────────────────────┬──────────┬─────────┬─────────────────┐ │
//! │  │ RobotState           │ on_enter │ on_exit │ on_update       │ │
//! │  ├──────────────────────┼──────────┼─────────┼─────────────────┤ │
//! │  │ Idle                 │ fn(ctx)  │ -       │ fn(ctx)->Option │ │
//! │  │ Forward … HardRight  │ fn(ctx)  │ -       │ fn(ctx)->Option │ │
//! │  │ IntersectionDetected │ fn(ctx)  │ -       │ fn(ctx)->Option │ │
//! │  │ Executing*           │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option │ │
//! │  │ PassingStraight      │ fn(ctx)  │ -       │ fn(ctx)->Option │ │
//! │  │ Arrived / OffLine    │ fn(ctx)  │ -       │ fn(ctx)->Option │ │
//! │  └──────────────────────┴──────────┴─────────┴─────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next)` with `next` different from the current
//! state, the engine runs `on_exit` for the current state, then
//! `on_enter` for the next, and updates the current pointer.  All
//! functions receive `&mut NavContext` which holds sensor readings, the
//! commanded motion, the route, config, and timing.

pub mod context;
pub mod line;
pub mod path;
pub mod states;

use context::NavContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all navigation states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
///
/// The discriminant is the numeric code reported in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RobotState {
    Idle = 0,
    Forward = 1,
    SoftLeft = 2,
    SoftRight = 3,
    HardLeft = 4,
    HardRight = 5,
    IntersectionDetected = 6,
    ExecutingLeft = 7,
    ExecutingRight = 8,
    ExecutingUTurn = 9,
    PassingStraight = 10,
    Arrived = 11,
    OffLine = 12,
}

impl RobotState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 13;

    /// Telemetry state code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable state name, for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Forward => "FORWARD",
            Self::SoftLeft => "SOFT_LEFT",
            Self::SoftRight => "SOFT_RIGHT",
            Self::HardLeft => "HARD_LEFT",
            Self::HardRight => "HARD_RIGHT",
            Self::IntersectionDetected => "INTERSECTION_DETECTED",
            Self::ExecutingLeft => "EXECUTING_LEFT",
            Self::ExecutingRight => "EXECUTING_RIGHT",
            Self::ExecutingUTurn => "EXECUTING_UTURN",
            Self::PassingStraight => "PASSING_STRAIGHT",
            Self::Arrived => "ARRIVED",
            Self::OffLine => "OFF_LINE",
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut NavContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut NavContext) -> Option<RobotState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: RobotState,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]) and tracks when
/// the current state was entered.  The [`NavContext`] is owned by the
/// caller and threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `RobotState as usize`.
    table: [StateDescriptor; RobotState::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Clock value at which the current state was entered.
    state_entry_ms: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; RobotState::COUNT], initial: RobotState) -> Self {
        Self {
            table,
            current: initial as usize,
            state_entry_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut NavContext) {
        info!("FSM starting in state: {}", self.current_state().name());
        self.state_entry_ms = ctx.now_ms;
        ctx.ms_in_state = 0;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.  `ctx.now_ms` must already hold the
    /// clock value for this tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)` and `next` differs from the current
    ///    state, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut NavContext) {
        ctx.ms_in_state = ctx.now_ms.saturating_sub(self.state_entry_ms);

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            if next_id as usize != self.current {
                self.transition(next_id, ctx);
            }
        }
    }

    /// Force an immediate transition (used when a new path is assigned or
    /// navigation is stopped, regardless of what `on_update` would say).
    /// Re-entering the current state re-runs its `on_enter`.
    pub fn force_transition(&mut self, next: RobotState, ctx: &mut NavContext) {
        self.transition(next, ctx);
    }

    /// The current state's identity.
    pub fn current_state(&self) -> RobotState {
        self.table[self.current].id
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: RobotState, ctx: &mut NavContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.current_state().name(),
            next_id.name()
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_ms = ctx.now_ms;
        ctx.ms_in_state = 0;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
