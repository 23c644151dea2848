//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the command router
//! emit these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them: log to
//! serial, drive the manipulator, map a device onto GPIO, etc.

use crate::fsm::RobotState;
use crate::fsm::context::{NodeLabel, TurnKind};

/// Identifier carried by task, device and node requests.  A longer
/// value does not decode.
pub type Name = heapless::String<MAX_NAME_LEN>;

/// Byte capacity of a [`Name`].
pub const MAX_NAME_LEN: usize = 64;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(RobotState),

    /// The FSM transitioned between states.
    StateChanged { from: RobotState, to: RobotState },

    /// A new path was accepted and navigation (re)started.
    PathAssigned { steps: usize },

    /// The robot halted on an intersection; `step` is the path index
    /// about to be executed.
    IntersectionReached { node: NodeLabel, step: usize },

    /// The path finished (`End` or exhausted).
    Arrived { steps: usize },

    /// A path digit outside 1–5 was skipped.
    MalformedStep { index: usize, code: char },

    /// Line reacquisition after a turn ran past its deadline.
    ReacquireTimeout(TurnKind),

    /// Navigation was stopped on request.
    Stopped,

    /// A manipulator task was requested.  Execution belongs to the
    /// manipulator controller.
    TaskRequested { action: Name, count: i32 },

    /// A manual device switch was requested.  Execution belongs to the
    /// device GPIO mapper.
    DeviceRequested { device: Name, on: bool },

    /// A node-based move was acknowledged.  No route is computed for it.
    TargetNodeRequested(Name),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// Pose and battery, supplied by collaborators outside the navigation
/// core.  Reported as-is in telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RobotStatus {
    pub pos_x: i32,
    pub pos_y: i32,
    pub battery: i32,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryData {
    pub robot_id: heapless::String<16>,
    pub status: RobotStatus,
    pub state: RobotState,
    pub node: NodeLabel,
    /// Far-left … far-right, 1 = line.
    pub sensors: [u8; 5],
}
