//! Five-channel IR line sensor array.
//!
//! Each channel is a digital input that reads HIGH when the line is under
//! the sensor.  Channels are ordered far-left (S1) to far-right (S5).
//! A read error counts as "no line": the sensor contract has no fault
//! reporting, and an inactive channel can at worst drop the robot into
//! `OffLine`.

use embedded_hal::digital::InputPin;

use crate::fsm::context::SensorSnapshot;

pub struct LineSensorArray<P> {
    channels: [P; 5],
}

impl<P: InputPin> LineSensorArray<P> {
    /// `channels` ordered far-left → far-right.
    pub fn new(channels: [P; 5]) -> Self {
        Self { channels }
    }

    /// Sample all five channels back to back.
    pub fn read(&mut self) -> SensorSnapshot {
        let mut active = [false; 5];
        for (slot, pin) in active.iter_mut().zip(self.channels.iter_mut()) {
            *slot = pin.is_high().unwrap_or(false);
        }
        SensorSnapshot::from_array(active)
    }
}
