//! JSON line protocol spoken with the control server.
//!
//! Inbound (TCP, one object per line):
//! ```text
//! {"cmd":"MOVE","path":"1435"}
//! {"cmd":"MOVE","target_node":"NODE-A1-001"}
//! {"cmd":"TASK","action":"PICK_AND_PLACE","count":5}
//! {"cmd":"MANUAL","device":"FAN","state":"ON"}
//! ```
//!
//! Outbound response (TCP): `{"status":"SUCCESS"|"FAIL","msg":"..."}`.
//!
//! Outbound telemetry (UDP):
//! `{"type":"ROBOT_STATE","robot_id":"R01","pos_x":0,"pos_y":0,"battery":100,
//! "state":1,"node":"A1","sensors":[0,1,1,1,0]}`.
//!
//! Decoding is two-step: the `cmd` discriminator is read first so an
//! unknown command is told apart from a malformed payload.

use serde::{Deserialize, Serialize};

use crate::app::events::{Name, TelemetryData};
use crate::error::ProtocolError;
use crate::fsm::context::NodeLabel;
use crate::fsm::path::{Path, PathError};

// ───────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Envelope {
    cmd: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node: Option<Name>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskRequest {
    pub action: Name,
    #[serde(default = "default_count")]
    pub count: i32,
}

fn default_count() -> i32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManualRequest {
    pub device: Name,
    pub state: DeviceState,
}

/// Where a `MOVE` wants the robot to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    /// A pre-planned path, one digit per intersection.
    Path(Path),
    /// A node id.  Acknowledged only; no route is derived from it.
    Node(Name),
}

/// A fully decoded inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(MoveTarget),
    Task { action: Name, count: i32 },
    Manual { device: Name, state: DeviceState },
}

/// Decode one protocol line.
///
/// A payload that is not JSON, lacks `cmd`, or does not fit the shape of
/// its command is [`ProtocolError::Malformed`]; a well-formed payload with
/// an unrecognised `cmd` is [`ProtocolError::UnknownCommand`].
pub fn decode_command(line: &[u8]) -> Result<Command, ProtocolError> {
    let envelope: Envelope =
        serde_json::from_slice(line).map_err(|_| ProtocolError::Malformed)?;

    match envelope.cmd.as_str() {
        "MOVE" => {
            let req: MoveRequest = parse(line)?;
            if let Some(digits) = req.path {
                let path = Path::parse(&digits).map_err(|e| match e {
                    PathError::Empty => ProtocolError::EmptyPath,
                    PathError::TooLong => ProtocolError::PathTooLong,
                })?;
                return Ok(Command::Move(MoveTarget::Path(path)));
            }
            req.target_node
                .map(|node| Command::Move(MoveTarget::Node(node)))
                .ok_or(ProtocolError::MissingField)
        }
        "TASK" => {
            let req: TaskRequest = parse(line)?;
            Ok(Command::Task {
                action: req.action,
                count: req.count,
            })
        }
        "MANUAL" => {
            let req: ManualRequest = parse(line)?;
            Ok(Command::Manual {
                device: req.device,
                state: req.state,
            })
        }
        _ => Err(ProtocolError::UnknownCommand),
    }
}

fn parse<'a, T: Deserialize<'a>>(line: &'a [u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(line).map_err(|_| ProtocolError::Malformed)
}

/// Encode a path `MOVE` line the way the planner sends it.
pub fn encode_move_path(path: &Path) -> Vec<u8> {
    #[derive(Serialize)]
    struct Move<'a> {
        cmd: &'static str,
        path: &'a str,
    }
    let digits = path.to_digits();
    serde_json::to_vec(&Move {
        cmd: "MOVE",
        path: digits.as_str(),
    })
    .unwrap_or_default()
}

// ───────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Fail,
}

/// Reply to exactly one inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: Status,
    pub msg: &'static str,
}

impl Response {
    pub const fn success(msg: &'static str) -> Self {
        Self {
            status: Status::Success,
            msg,
        }
    }

    pub const fn fail(err: ProtocolError) -> Self {
        Self {
            status: Status::Fail,
            msg: err.response_msg(),
        }
    }
}

pub const MSG_PATH_STARTED: &str = "path following started";
pub const MSG_TARGET_ACK: &str = "target node acknowledged";
pub const MSG_TASK_ACK: &str = "task acknowledged";
pub const MSG_MANUAL_ACK: &str = "manual control acknowledged";

/// Periodic state broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryFrame {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub robot_id: heapless::String<16>,
    pub pos_x: i32,
    pub pos_y: i32,
    pub battery: i32,
    /// Numeric [`RobotState`](crate::fsm::RobotState) code.
    pub state: u8,
    pub node: NodeLabel,
    pub sensors: [u8; 5],
}

impl From<&TelemetryData> for TelemetryFrame {
    fn from(t: &TelemetryData) -> Self {
        Self {
            kind: "ROBOT_STATE",
            robot_id: t.robot_id.clone(),
            pos_x: t.status.pos_x,
            pos_y: t.status.pos_y,
            battery: t.status.battery,
            state: t.state.code(),
            node: t.node.clone(),
            sensors: t.sensors,
        }
    }
}
