//! GPIO / peripheral pin assignments for the robot main board.
//!
//! Single source of truth: the binary wires drivers from these numbers
//! rather than hard-coding them.  Change a pin here and it propagates
//! everywhere.

// ---------------------------------------------------------------------------
// Drive motors (L298N dual H-bridge)
// ---------------------------------------------------------------------------

/// LEDC PWM output: left motor enable.
pub const MOTOR_ENA_GPIO: i32 = 14;
/// Left motor direction 1.
pub const MOTOR_IN1_GPIO: i32 = 27;
/// Left motor direction 2.
pub const MOTOR_IN2_GPIO: i32 = 26;
/// Right motor direction 1.
pub const MOTOR_IN3_GPIO: i32 = 25;
/// Right motor direction 2.
pub const MOTOR_IN4_GPIO: i32 = 32;
/// LEDC PWM output: right motor enable.
pub const MOTOR_ENB_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Line sensors (5-channel IR array, HIGH = line under sensor)
// ---------------------------------------------------------------------------

pub const LINE_S1_GPIO: i32 = 18; // far-left
pub const LINE_S2_GPIO: i32 = 19; // left
pub const LINE_S3_GPIO: i32 = 21; // center
pub const LINE_S4_GPIO: i32 = 22; // right
pub const LINE_S5_GPIO: i32 = 23; // far-right

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels, the
/// same scale as the configured drive speeds.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the drive motors.
pub const MOTOR_PWM_FREQ_HZ: u32 = 1_000;
