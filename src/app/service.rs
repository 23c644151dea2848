//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the navigation FSM and its shared context.  It
//! exposes a clean, hardware-agnostic API.  All I/O flows through port
//! traits injected at call sites, making the entire service testable
//! with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │       AppService        │
//! ActuatorPort ◀──│  FSM · Route · Motion   │
//!                 └────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::SystemConfig;
use crate::fsm::context::{Motion, NODE_START, NavContext, NavNotice, SensorSnapshot};
use crate::fsm::path::Path;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, RobotState};

use super::commands::AppCommand;
use super::events::{AppEvent, RobotStatus, TelemetryData};
use super::ports::{ActuatorPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all navigation logic.
pub struct AppService {
    fsm: Fsm,
    ctx: NavContext,
    /// Last motion issued to the actuator port (`None` before the first).
    applied: Option<Motion>,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let ctx = NavContext::new(config);
        let fsm = Fsm::new(build_state_table(), RobotState::Idle);
        Self {
            fsm,
            ctx,
            applied: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Program the speed tiers, enter `Idle` and stop the motors.
    pub fn start(&mut self, now_ms: u64, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        let cfg = &self.ctx.config;
        hw.set_speeds(
            i32::from(cfg.speed_forward),
            i32::from(cfg.speed_soft),
            i32::from(cfg.speed_hard),
        );
        self.ctx.now_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        self.apply_motion(hw);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {}", self.fsm.current_state().name());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one navigation step: read sensors → FSM → actuators → events.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        let prev_state = self.fsm.current_state();
        let prev_cursor = self.ctx.route.cursor();

        // 1. Sample sensors via SensorPort
        self.ctx.sensors = hw.read_line();
        self.ctx.now_ms = now_ms;

        // 2. FSM tick (pure state logic)
        self.fsm.tick(&mut self.ctx);

        // 3. Apply the commanded motion via ActuatorPort
        self.apply_motion(hw);

        // 4. Report what happened
        self.drain_notices(sink);
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
            match new_state {
                RobotState::IntersectionDetected => {
                    sink.emit(&AppEvent::IntersectionReached {
                        node: self.ctx.node.clone(),
                        step: prev_cursor,
                    });
                }
                RobotState::Arrived => {
                    sink.emit(&AppEvent::Arrived {
                        steps: self.ctx.route.cursor(),
                    });
                }
                _ => {}
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (from the router or startup code).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;
        match cmd {
            AppCommand::FollowPath(path) => self.assign_path(path, hw, sink),
            AppCommand::Stop => {
                let prev = self.fsm.current_state();
                self.fsm.force_transition(RobotState::Idle, &mut self.ctx);
                self.apply_motion(hw);
                sink.emit(&AppEvent::Stopped);
                self.emit_transition(prev, sink);
            }
            AppCommand::SetSpeeds {
                forward,
                soft,
                hard,
            } => {
                hw.set_speeds(forward, soft, hard);
                let cfg = &mut self.ctx.config;
                cfg.speed_forward = clamp_duty(forward);
                cfg.speed_soft = clamp_duty(soft);
                cfg.speed_hard = clamp_duty(hard);
                info!(
                    "Speeds set: forward={} soft={} hard={}",
                    cfg.speed_forward, cfg.speed_soft, cfg.speed_hard
                );
            }
        }
    }

    fn assign_path(&mut self, path: Path, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if self.ctx.route.is_running() {
            warn!(
                "New path replaces running path at step {}",
                self.ctx.route.cursor()
            );
        }
        let prev = self.fsm.current_state();
        let steps = path.len();
        info!("Path assigned: {} ({} steps)", path.to_digits(), steps);

        self.ctx.route.assign(path);
        self.ctx.set_node(NODE_START);
        self.ctx.turn = None;
        self.fsm.force_transition(RobotState::Forward, &mut self.ctx);
        self.apply_motion(hw);

        sink.emit(&AppEvent::PathAssigned { steps });
        self.emit_transition(prev, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self, status: RobotStatus) -> TelemetryData {
        TelemetryData {
            robot_id: self.ctx.config.robot_id.clone(),
            status,
            state: self.fsm.current_state(),
            node: self.ctx.node.clone(),
            sensors: self.ctx.sensors.as_bits(),
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> RobotState {
        self.fsm.current_state()
    }

    /// Label of the last node passed.
    pub fn node(&self) -> &str {
        self.ctx.node.as_str()
    }

    /// Sensor snapshot from the latest tick.
    pub fn sensors(&self) -> SensorSnapshot {
        self.ctx.sensors
    }

    /// Index of the next path step to execute.
    pub fn cursor(&self) -> usize {
        self.ctx.route.cursor()
    }

    pub fn path(&self) -> &Path {
        self.ctx.route.path()
    }

    pub fn is_running(&self) -> bool {
        self.ctx.route.is_running()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Issue the commanded motion if it differs from the last one sent.
    fn apply_motion(&mut self, hw: &mut impl ActuatorPort) {
        let motion = self.ctx.motion;
        if self.applied == Some(motion) {
            return;
        }
        match motion {
            Motion::Stop => hw.stop(),
            Motion::Forward => hw.forward(),
            Motion::SoftLeft => hw.soft_left(),
            Motion::SoftRight => hw.soft_right(),
            Motion::HardLeft => hw.hard_left(),
            Motion::HardRight => hw.hard_right(),
            Motion::UTurn => hw.u_turn(),
        }
        self.applied = Some(motion);
    }

    fn drain_notices(&mut self, sink: &mut impl EventSink) {
        for notice in &self.ctx.notices {
            let event = match *notice {
                NavNotice::MalformedStep { index, code } => AppEvent::MalformedStep { index, code },
                NavNotice::ReacquireTimeout { kind } => AppEvent::ReacquireTimeout(kind),
            };
            sink.emit(&event);
        }
        self.ctx.notices.clear();
    }

    fn emit_transition(&self, prev: RobotState, sink: &mut impl EventSink) {
        let to = self.fsm.current_state();
        if to != prev {
            sink.emit(&AppEvent::StateChanged { from: prev, to });
        }
    }
}

fn clamp_duty(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}
