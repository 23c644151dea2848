//! Actuator and sensor drivers over `embedded-hal` traits.

pub mod line_sensor;
pub mod motor;
