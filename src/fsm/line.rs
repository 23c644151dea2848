//! Pure sensor-pattern rules: intersection detection, line-following
//! resolution, and line reacquisition.
//!
//! These functions only look at a [`SensorSnapshot`]; state handlers
//! call them and decide what to do with the answer.

use super::RobotState;
use super::context::SensorSnapshot;

/// An intersection is (far-left ∧ far-right) ∨ (left ∧ right ∧ ¬center).
///
/// A plain "two side sensors" test fires on wide curves; the second clause
/// only accepts the side pair when the center has dropped off the line.
pub fn detect_intersection(s: &SensorSnapshot) -> bool {
    (s.far_left && s.far_right) || (s.left && s.right && !s.center)
}

/// Resolve one line-following state from the snapshot.
///
/// Rules are checked in priority order so a clean center lock is never
/// overridden by noisy side readings.  The result is always one of
/// `Forward`, `SoftLeft`, `SoftRight`, `HardLeft`, `HardRight`, `OffLine`.
pub fn resolve_line(s: &SensorSnapshot) -> RobotState {
    if s.center && !s.far_left && !s.far_right {
        RobotState::Forward
    } else if s.left && !s.far_left {
        RobotState::SoftLeft
    } else if s.right && !s.far_right {
        RobotState::SoftRight
    } else if s.far_left {
        RobotState::HardLeft
    } else if s.far_right {
        RobotState::HardRight
    } else {
        RobotState::OffLine
    }
}

/// The line is locked again once the center and at least one neighbour
/// see it.
pub fn line_locked(s: &SensorSnapshot) -> bool {
    s.center && (s.left || s.right)
}
