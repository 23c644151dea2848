//! System configuration parameters
//!
//! All tunable parameters for the transport robot: drive speeds, the
//! intersection manoeuvre timings, loop pacing, and link endpoints.
//! Values are compiled in; the binary may override them at startup.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity ---
    /// Robot identifier reported in every telemetry frame
    pub robot_id: heapless::String<16>,

    // --- Drive speeds (PWM duty, 0-255) ---
    /// Duty used for straight-line driving
    pub speed_forward: u8,
    /// Duty used for soft corrections
    pub speed_soft: u8,
    /// Duty used for hard corrections, turns and U-turns
    pub speed_hard: u8,

    // --- Intersection manoeuvres ---
    /// Halt duration at an intersection before acting (ms)
    pub settle_ms: u32,
    /// Forward creep that clears the intersection centre (ms)
    pub creep_ms: u32,
    /// Blind turn before line reacquisition starts (ms)
    pub turn_commit_ms: u32,
    /// Forward pass across an intersection for `Straight` (ms)
    pub straight_pass_ms: u32,
    /// Deadline for reacquiring the line after a turn (ms)
    pub reacquire_timeout_ms: u32,

    // --- Timing ---
    /// Pacing delay of the polling cycle (ms)
    pub control_loop_interval_ms: u32,
    /// Telemetry broadcast period (ms)
    pub telemetry_interval_ms: u32,

    // --- Link ---
    /// Control server host (TCP commands, UDP telemetry)
    pub server_host: heapless::String<32>,
    /// TCP port for commands and responses
    pub command_port: u16,
    /// UDP port for telemetry datagrams
    pub telemetry_port: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut robot_id = heapless::String::new();
        let _ = robot_id.push_str("R01");
        let mut server_host = heapless::String::new();
        let _ = server_host.push_str("192.168.0.10");

        Self {
            robot_id,

            // Drive speeds
            speed_forward: 200,
            speed_soft: 200,
            speed_hard: 255,

            // Manoeuvres
            settle_ms: 500,
            creep_ms: 150,
            turn_commit_ms: 250,
            straight_pass_ms: 300,
            reacquire_timeout_ms: 8_000,

            // Timing
            control_loop_interval_ms: 10,  // 100 Hz
            telemetry_interval_ms: 1_000, // 1 Hz

            // Link
            server_host,
            command_port: 8080,
            telemetry_port: 9000,
        }
    }
}

impl SystemConfig {
    /// Range-check the configuration before it is handed to the app core.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.robot_id.is_empty() {
            return Err(ConfigError::ValidationFailed("robot_id must not be empty"));
        }
        if self.control_loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be > 0",
            ));
        }
        if self.telemetry_interval_ms <= self.control_loop_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_ms must exceed control_loop_interval_ms",
            ));
        }
        if self.reacquire_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "reacquire_timeout_ms must be > 0",
            ));
        }
        if self.reacquire_timeout_ms <= self.turn_commit_ms {
            return Err(ConfigError::ValidationFailed(
                "reacquire_timeout_ms must exceed turn_commit_ms",
            ));
        }
        if self.command_port == 0 || self.telemetry_port == 0 {
            return Err(ConfigError::ValidationFailed("ports must be non-zero"));
        }
        Ok(())
    }
}
