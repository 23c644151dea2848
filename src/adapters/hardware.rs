//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the line sensor array and the drive motor bridge, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  This is the only module
//! in the system that touches actual hardware; the drivers themselves
//! are generic over `embedded-hal`, so the adapter is exercised on the
//! host with in-memory pins.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::line_sensor::LineSensorArray;
use crate::drivers::motor::MotorDriver;
use crate::fsm::context::SensorSnapshot;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I, O, E> {
    sensors: LineSensorArray<I>,
    motors: MotorDriver<O, E>,
}

impl<I, O, E> HardwareAdapter<I, O, E>
where
    I: InputPin,
    O: OutputPin,
    E: SetDutyCycle,
{
    pub fn new(sensors: LineSensorArray<I>, motors: MotorDriver<O, E>) -> Self {
        Self { sensors, motors }
    }

    pub fn motors(&self) -> &MotorDriver<O, E> {
        &self.motors
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I: InputPin, O, E> SensorPort for HardwareAdapter<I, O, E> {
    fn read_line(&mut self) -> SensorSnapshot {
        self.sensors.read()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I, O: OutputPin, E: SetDutyCycle> ActuatorPort for HardwareAdapter<I, O, E> {
    fn forward(&mut self) {
        self.motors.forward();
    }

    fn soft_left(&mut self) {
        self.motors.soft_left();
    }

    fn soft_right(&mut self) {
        self.motors.soft_right();
    }

    fn hard_left(&mut self) {
        self.motors.hard_left();
    }

    fn hard_right(&mut self) {
        self.motors.hard_right();
    }

    fn u_turn(&mut self) {
        self.motors.u_turn();
    }

    fn stop(&mut self) {
        self.motors.stop();
    }

    fn set_speeds(&mut self, forward: i32, soft: i32, hard: i32) {
        self.motors.set_speeds(forward, soft, hard);
    }
}
