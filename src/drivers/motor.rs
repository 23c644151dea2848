//! Drive motor driver (L298N dual H-bridge).
//!
//! Two DC motors, each with a PWM enable line (ENA / ENB) and two
//! direction inputs (IN1/IN2 left, IN3/IN4 right).  Every motion
//! primitive is a fixed pin pattern plus one of three speed tiers:
//!
//! | primitive    | IN1 | IN2 | IN3 | IN4 | duty    |
//! |--------------|-----|-----|-----|-----|---------|
//! | forward      |  H  |  L  |  L  |  H  | forward |
//! | soft left    |  H  |  L  |  L  |  L  | soft    |
//! | soft right   |  L  |  L  |  L  |  H  | soft    |
//! | hard left    |  H  |  L  |  L  |  L  | hard    |
//! | hard right   |  L  |  L  |  L  |  H  | hard    |
//! | U-turn       |  L  |  H  |  L  |  H  | hard    |
//! | stop         |  L  |  L  |  L  |  L  | 0       |
//!
//! The driver is generic over `embedded-hal` 1.0 pin and PWM traits so the
//! same code runs on the ESP32 (`PinDriver` / `LedcDriver`) and against
//! in-memory pins in tests.  Pin errors are swallowed: the actuator
//! contract has no fault reporting.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::debug;

/// Full-scale duty value.
pub const MAX_SPEED: u8 = 255;

/// The primitive currently driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    Stopped,
    Forward,
    SoftLeft,
    SoftRight,
    HardLeft,
    HardRight,
    UTurn,
}

/// Duty for each speed tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedTiers {
    pub forward: u8,
    pub soft: u8,
    pub hard: u8,
}

impl Default for SpeedTiers {
    fn default() -> Self {
        Self {
            forward: 200,
            soft: 200,
            hard: MAX_SPEED,
        }
    }
}

/// Direction lines of the bridge.
pub struct BridgePins<P> {
    pub in1: P,
    pub in2: P,
    pub in3: P,
    pub in4: P,
}

pub struct MotorDriver<P, E> {
    pins: BridgePins<P>,
    ena: E,
    enb: E,
    speeds: SpeedTiers,
    drive: Drive,
}

impl<P: OutputPin, E: SetDutyCycle> MotorDriver<P, E> {
    /// Take ownership of the bridge and leave it stopped.
    pub fn new(pins: BridgePins<P>, ena: E, enb: E) -> Self {
        let mut driver = Self {
            pins,
            ena,
            enb,
            speeds: SpeedTiers::default(),
            drive: Drive::Stopped,
        };
        driver.stop();
        driver
    }

    /// Clamp each tier to 0–255 independently.  Takes effect with the
    /// next primitive.
    pub fn set_speeds(&mut self, forward: i32, soft: i32, hard: i32) {
        self.speeds = SpeedTiers {
            forward: clamp_speed(forward),
            soft: clamp_speed(soft),
            hard: clamp_speed(hard),
        };
        debug!("motor: speeds {:?}", self.speeds);
    }

    pub fn forward(&mut self) {
        self.apply(Drive::Forward, [true, false, false, true], self.speeds.forward);
    }

    pub fn soft_left(&mut self) {
        self.apply(Drive::SoftLeft, [true, false, false, false], self.speeds.soft);
    }

    pub fn soft_right(&mut self) {
        self.apply(Drive::SoftRight, [false, false, false, true], self.speeds.soft);
    }

    pub fn hard_left(&mut self) {
        self.apply(Drive::HardLeft, [true, false, false, false], self.speeds.hard);
    }

    pub fn hard_right(&mut self) {
        self.apply(Drive::HardRight, [false, false, false, true], self.speeds.hard);
    }

    /// Spin in place: left wheel backwards, right wheel forwards.
    pub fn u_turn(&mut self) {
        self.apply(Drive::UTurn, [false, true, false, true], self.speeds.hard);
    }

    pub fn stop(&mut self) {
        self.apply(Drive::Stopped, [false; 4], 0);
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    pub fn speeds(&self) -> SpeedTiers {
        self.speeds
    }

    /// Release the pins (tests inspect them afterwards).
    pub fn release(self) -> (BridgePins<P>, E, E) {
        (self.pins, self.ena, self.enb)
    }

    fn apply(&mut self, drive: Drive, levels: [bool; 4], duty: u8) {
        let BridgePins { in1, in2, in3, in4 } = &mut self.pins;
        for (pin, high) in [in1, in2, in3, in4].into_iter().zip(levels) {
            let _ = if high { pin.set_high() } else { pin.set_low() };
        }
        let _ = self
            .ena
            .set_duty_cycle_fraction(u16::from(duty), u16::from(MAX_SPEED));
        let _ = self
            .enb
            .set_duty_cycle_fraction(u16::from(duty), u16::from(MAX_SPEED));
        self.drive = drive;
    }
}

fn clamp_speed(value: i32) -> u8 {
    value.clamp(0, i32::from(MAX_SPEED)) as u8
}
