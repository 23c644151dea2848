//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements    | Connects to                     |
//! |-----------------|---------------|---------------------------------|
//! | `hardware`      | SensorPort    | IR line sensor array (GPIO)     |
//! |                 | ActuatorPort  | L298N bridge (GPIO + LEDC PWM)  |
//! | `log_sink`      | EventSink     | Serial log output               |
//! | `net_transport` | Transport     | TCP command stream + UDP telemetry |
//! | `time`          | ClockPort     | ESP32 system timer              |

pub mod hardware;
pub mod log_sink;
pub mod net_transport;
pub mod time;
