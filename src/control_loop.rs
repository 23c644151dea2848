//! Cooperative control loop.
//!
//! One call to [`ControlLoop::run_cycle`] is one pass of the polling loop:
//!
//! ```text
//!  ┌──────────────┐   ┌──────────────────────┐   ┌────────────────────┐
//!  │ AppService   │──▶│ CommandRouter        │──▶│ Scheduler          │
//!  │ tick (nav)   │   │ ≤ 1 inbound message  │   │ telemetry interval │
//!  └──────────────┘   └──────────────────────┘   └────────────────────┘
//! ```
//!
//! Nothing here blocks.  The binary paces cycles with
//! `control_loop_interval_ms`; tests drive `now_ms` directly.  Blocking
//! work the binary does between cycles (reconnecting the command stream)
//! is gated on [`ControlLoop::can_block`].

use log::info;

use crate::app::events::{AppEvent, RobotStatus};
use crate::app::ports::{ActuatorPort, EventSink, SchedulerDelegate, SensorPort};
use crate::app::service::AppService;
use crate::config::SystemConfig;
use crate::rpc::protocol::Response;
use crate::rpc::router::CommandRouter;
use crate::rpc::transport::Transport;
use crate::scheduler::{Schedule, Scheduler};

/// Label of the telemetry schedule.
pub const TELEMETRY_SCHEDULE: &str = "telemetry";

/// Owns every piece of runtime state.  No globals.
pub struct ControlLoop<T: Transport> {
    app: AppService,
    router: CommandRouter<T>,
    scheduler: Scheduler,
    status: RobotStatus,
    telemetry_sent: u64,
}

impl<T: Transport> ControlLoop<T> {
    /// Build the loop.  Call [`start`](Self::start) before the first
    /// cycle.
    pub fn new(config: SystemConfig, transport: T) -> Self {
        Self {
            app: AppService::new(config),
            router: CommandRouter::new(transport),
            scheduler: Scheduler::new(),
            status: RobotStatus::default(),
            telemetry_sent: 0,
        }
    }

    /// Start the navigation core.  The telemetry interval is measured
    /// from `now_ms`.
    pub fn start(&mut self, now_ms: u64, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.scheduler = Scheduler::new();
        // A fresh scheduler always has a free slot.
        let _ = self.scheduler.add(
            Schedule {
                label: TELEMETRY_SCHEDULE,
                interval_ms: self.app.config().telemetry_interval_ms,
                enabled: true,
            },
            now_ms,
        );
        self.app.start(now_ms, hw, sink);
        info!("Control loop started at {} ms", now_ms);
    }

    /// One pass: navigation tick, one inbound message, telemetry.
    /// Returns the response to the inbound message, if one was handled.
    pub fn run_cycle(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> Option<Response> {
        self.app.tick(now_ms, hw, sink);

        let response = self
            .router
            .handle_incoming(&mut self.app, hw, sink, now_ms);

        let Self {
            app,
            router,
            scheduler,
            status,
            telemetry_sent,
        } = self;
        let mut delegate = TelemetryDelegate {
            app,
            router,
            sink,
            status: *status,
            sent: telemetry_sent,
        };
        scheduler.tick(now_ms, &mut delegate);

        response
    }

    /// True when a stall between cycles cannot leave the robot driving
    /// unattended: no route is running, so the motors are stopped.
    pub fn can_block(&self) -> bool {
        !self.app.is_running()
    }

    /// Update the externally supplied pose and battery.
    pub fn set_status(&mut self, status: RobotStatus) {
        self.status = status;
    }

    pub fn app(&self) -> &AppService {
        &self.app
    }

    pub fn router(&self) -> &CommandRouter<T> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut CommandRouter<T> {
        &mut self.router
    }

    /// Telemetry datagrams sent since construction.
    pub fn telemetry_sent(&self) -> u64 {
        self.telemetry_sent
    }
}

/// Bridges scheduler fires to the telemetry broadcast.
struct TelemetryDelegate<'a, T: Transport, S: EventSink> {
    app: &'a AppService,
    router: &'a mut CommandRouter<T>,
    sink: &'a mut S,
    status: RobotStatus,
    sent: &'a mut u64,
}

impl<T: Transport, S: EventSink> SchedulerDelegate for TelemetryDelegate<'_, T, S> {
    fn on_schedule_fired(&mut self, label: &str, _now_ms: u64) {
        if label != TELEMETRY_SCHEDULE {
            return;
        }
        let data = self.app.build_telemetry(self.status);
        self.router.broadcast_telemetry(&data);
        *self.sent += 1;
        self.sink.emit(&AppEvent::Telemetry(data));
    }
}
