//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (line sensors, drive motors, event sinks, clocks)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the navigation core never touches
//! hardware directly.

use crate::fsm::context::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per tick.
pub trait SensorPort {
    /// Sample all five line sensors at once.  Never blocks.
    fn read_line(&mut self) -> SensorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: discrete motion primitives.
///
/// Each primitive persists until the next one supersedes it; there is no
/// automatic timeout.  Hardware faults are not observable through this
/// port.
pub trait ActuatorPort {
    fn forward(&mut self);
    fn soft_left(&mut self);
    fn soft_right(&mut self);
    fn hard_left(&mut self);
    fn hard_right(&mut self);
    /// Spin in place (rightwards) to reverse heading.
    fn u_turn(&mut self);
    fn stop(&mut self);

    /// Set the duty for each speed tier.  Out-of-range values are
    /// clamped to the device range, never rejected.
    fn set_speeds(&mut self, forward: i32, soft: i32, hard: i32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / collaborators)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go: serial log, the
/// manipulator controller, the device GPIO mapper.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock used to pace timed sub-states and
/// telemetry.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from telemetry transport)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a schedule fires.
pub trait SchedulerDelegate {
    /// Called when the schedule labelled `label` fires at `now_ms`.
    fn on_schedule_fired(&mut self, label: &str, now_ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
