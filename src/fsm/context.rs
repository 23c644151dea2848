//! Shared mutable context threaded through every FSM handler.
//!
//! `NavContext` is the single struct that state handlers read from and
//! write to.  It contains the latest line-sensor snapshot, the commanded
//! motion, the route being executed, the node label, turn progress and
//! timing.  Think of it as the "blackboard" in a blackboard architecture.

use core::fmt::Write as _;

use crate::config::SystemConfig;

use super::path::Route;

// ---------------------------------------------------------------------------
// Sensor snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// The five line sensors, sampled together once per tick.
/// `true` = line under the sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSnapshot {
    pub far_left: bool,
    pub left: bool,
    pub center: bool,
    pub right: bool,
    pub far_right: bool,
}

impl SensorSnapshot {
    /// Build from readings ordered far-left → far-right.
    pub fn from_array(s: [bool; 5]) -> Self {
        Self {
            far_left: s[0],
            left: s[1],
            center: s[2],
            right: s[3],
            far_right: s[4],
        }
    }

    pub fn as_array(&self) -> [bool; 5] {
        [
            self.far_left,
            self.left,
            self.center,
            self.right,
            self.far_right,
        ]
    }

    /// Readings as 0/1 for the telemetry `sensors` array.
    pub fn as_bits(&self) -> [u8; 5] {
        self.as_array().map(u8::from)
    }

    pub fn none_active(&self) -> bool {
        !self.as_array().contains(&true)
    }
}

// ---------------------------------------------------------------------------
// Motion command (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Motion primitive requested by the current state.  The service issues
/// the matching [`ActuatorPort`](crate::app::ports::ActuatorPort) call
/// whenever this changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Motion {
    #[default]
    Stop,
    Forward,
    SoftLeft,
    SoftRight,
    HardLeft,
    HardRight,
    UTurn,
}

// ---------------------------------------------------------------------------
// Turn progress (timed sub-states of the Executing* states)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Left,
    Right,
    UTurn,
}

impl TurnKind {
    /// Motion held during the commit phase.
    pub fn motion(self) -> Motion {
        match self {
            Self::Left => Motion::HardLeft,
            Self::Right => Motion::HardRight,
            Self::UTurn => Motion::UTurn,
        }
    }
}

/// Stages of line reacquisition.  Left/right turns only use `LockLine`;
/// a U-turn walks all three so it cannot lock onto the line it is
/// turning away from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReacquireStage {
    /// Wait for the stale trailing line to reach the front sensors.
    CrossStaleLine,
    /// Wait until every sensor has left the stale line.
    ClearStaleLine,
    /// Wait for center plus one neighbour on the real line.
    LockLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Forward creep clearing the intersection center.
    Creep,
    /// Blind turn before sensors are consulted.
    Commit,
    /// Polling the sensors for the new line, bounded by a deadline.
    Reacquire(ReacquireStage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnProgress {
    pub kind: TurnKind,
    pub phase: TurnPhase,
    /// Clock value when `phase` was entered.
    pub phase_started_ms: u64,
}

impl TurnProgress {
    pub fn new(kind: TurnKind, now_ms: u64) -> Self {
        Self {
            kind,
            phase: TurnPhase::Creep,
            phase_started_ms: now_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Notices (written by handlers; drained into AppEvents by the service)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavNotice {
    /// A path digit outside 1–5 was skipped.
    MalformedStep { index: usize, code: char },
    /// Reacquisition ran past its deadline.
    ReacquireTimeout { kind: TurnKind },
}

const MAX_NOTICES: usize = 4;

// ---------------------------------------------------------------------------
// Node label
// ---------------------------------------------------------------------------

pub type NodeLabel = heapless::String<16>;

pub const NODE_NONE: &str = "-";
pub const NODE_START: &str = "START";
pub const NODE_ARRIVED: &str = "ARRIVED";

// ---------------------------------------------------------------------------
// NavContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct NavContext {
    // -- Timing --
    /// Clock value for the current tick.
    pub now_ms: u64,
    /// Milliseconds since the current state was entered.
    pub ms_in_state: u64,
    /// Clock value when the intersection settle delay last (re)started.
    pub settle_started_ms: u64,

    // -- Sensor data --
    /// Latest line readings.  Updated before each FSM tick.
    pub sensors: SensorSnapshot,

    // -- Actuator output --
    /// Motion to be applied after the FSM tick.
    pub motion: Motion,

    // -- Navigation --
    pub route: Route,
    pub node: NodeLabel,
    /// Progress of the turn being executed, if any.
    pub turn: Option<TurnProgress>,
    pub notices: heapless::Vec<NavNotice, MAX_NOTICES>,

    // -- Configuration --
    pub config: SystemConfig,
}

impl NavContext {
    pub fn new(config: SystemConfig) -> Self {
        let mut ctx = Self {
            now_ms: 0,
            ms_in_state: 0,
            settle_started_ms: 0,
            sensors: SensorSnapshot::default(),
            motion: Motion::Stop,
            route: Route::default(),
            node: NodeLabel::new(),
            turn: None,
            notices: heapless::Vec::new(),
            config,
        };
        ctx.set_node(NODE_NONE);
        ctx
    }

    pub fn set_node(&mut self, label: &str) {
        self.node.clear();
        let _ = self.node.push_str(label);
    }

    /// Label for the intersection at the current cursor: `A1`, `A2`, …
    pub fn set_node_for_cursor(&mut self) {
        self.node.clear();
        let _ = write!(self.node, "A{}", self.route.cursor() + 1);
    }

    /// Queue a notice for the service.  The oldest is dropped when full.
    pub fn notify(&mut self, notice: NavNotice) {
        if self.notices.is_full() {
            self.notices.remove(0);
        }
        let _ = self.notices.push(notice);
    }

    /// Milliseconds since the robot last stopped to settle on a cross.
    pub fn ms_settling(&self) -> u64 {
        self.now_ms.saturating_sub(self.settle_started_ms)
    }

    /// Milliseconds spent in the current turn phase.
    pub fn ms_in_phase(&self) -> u64 {
        self.turn
            .map_or(0, |t| self.now_ms.saturating_sub(t.phase_started_ms))
    }
}
