//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART on the robot).  The manipulator controller or a
//! device GPIO mapper would implement the same trait.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                debug!(
                    "TELEM | {} | state={} | node={} | sensors={:?} | \
                     pos=({}, {}) | battery={}",
                    t.robot_id,
                    t.state.name(),
                    t.node,
                    t.sensors,
                    t.status.pos_x,
                    t.status.pos_y,
                    t.status.battery,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::PathAssigned { steps } => {
                info!("PATH  | assigned, {} steps", steps);
            }
            AppEvent::IntersectionReached { node, step } => {
                info!("NODE  | {} (step {})", node, step);
            }
            AppEvent::Arrived { steps } => {
                info!("NODE  | arrived after {} steps", steps);
            }
            AppEvent::MalformedStep { index, code } => {
                warn!("PATH  | skipped malformed step {:?} at {}", code, index);
            }
            AppEvent::ReacquireTimeout(kind) => {
                warn!("TURN  | {:?} reacquire timed out", kind);
            }
            AppEvent::Stopped => {
                info!("STOP  | navigation stopped");
            }
            AppEvent::TaskRequested { action, count } => {
                info!("TASK  | {} x{}", action, count);
            }
            AppEvent::DeviceRequested { device, on } => {
                info!("DEVICE| {} {}", device, if *on { "ON" } else { "OFF" });
            }
            AppEvent::TargetNodeRequested(node) => {
                info!("MOVE  | target node {} acknowledged", node);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state.name());
            }
        }
    }
}
