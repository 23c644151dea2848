//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (the command
//! router, the binary's startup code, tests) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::fsm::path::Path;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Replace the active path and start following it from the head.
    /// Abandons any turn in progress.
    FollowPath(Path),

    /// Stop the motors, clear the running flag and return to `Idle`.
    Stop,

    /// Change the duty of each speed tier.  Values are clamped to 0–255.
    SetSpeeds { forward: i32, soft: i32, hard: i32 },
}
