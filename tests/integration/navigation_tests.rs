//! Integration tests for the AppService → FSM → actuators pipeline.
//!
//! A small simulator feeds scripted sensor patterns at the 10 ms loop
//! cadence and checks the motion primitives and events that come out.

use super::mock_hw::{
    ActuatorCall, CROSS, LOCKED, MockHardware, NONE, ON_LINE, RecordingSink,
};

use nursery_agv::app::commands::AppCommand;
use nursery_agv::app::events::AppEvent;
use nursery_agv::app::service::AppService;
use nursery_agv::config::SystemConfig;
use nursery_agv::fsm::RobotState;
use nursery_agv::fsm::context::TurnKind;
use nursery_agv::fsm::path::Path;

const STEP_MS: u64 = 10;

struct Sim {
    app: AppService,
    hw: MockHardware,
    sink: RecordingSink,
    now: u64,
}

impl Sim {
    fn new() -> Self {
        let mut sim = Self {
            app: AppService::new(SystemConfig::default()),
            hw: MockHardware::new(),
            sink: RecordingSink::new(),
            now: 0,
        };
        sim.app.start(sim.now, &mut sim.hw, &mut sim.sink);
        sim
    }

    fn follow(&mut self, digits: &str) {
        let path = Path::parse(digits).expect("valid path");
        self.app
            .handle_command(AppCommand::FollowPath(path), self.now, &mut self.hw, &mut self.sink);
    }

    fn step(&mut self, bits: [bool; 5]) -> RobotState {
        self.now += STEP_MS;
        self.hw.set_sensors(bits);
        self.app.tick(self.now, &mut self.hw, &mut self.sink);
        self.app.state()
    }

    /// Tick with `bits` until `done` holds.  Returns the elapsed time, or
    /// `None` if `max_ms` passed first.
    fn run_until(
        &mut self,
        bits: [bool; 5],
        max_ms: u64,
        done: impl Fn(&Self) -> bool,
    ) -> Option<u64> {
        let start = self.now;
        while self.now - start < max_ms {
            self.step(bits);
            if done(self) {
                return Some(self.now - start);
            }
        }
        None
    }

    fn hold(&mut self, bits: [bool; 5], ms: u64) {
        for _ in 0..ms / STEP_MS {
            self.step(bits);
        }
    }

    fn state(&self) -> RobotState {
        self.app.state()
    }
}

// ── Path following ────────────────────────────────────────────

#[test]
fn left_turn_then_end_arrives_at_second_node() {
    let mut sim = Sim::new();
    sim.follow("15");
    assert_eq!(sim.state(), RobotState::Forward);
    assert_eq!(sim.app.node(), "START");
    assert_eq!(sim.hw.last_motion(), Some(ActuatorCall::Forward));

    assert_eq!(sim.step(ON_LINE), RobotState::Forward);
    assert_eq!(sim.step(CROSS), RobotState::IntersectionDetected);
    assert_eq!(sim.app.node(), "A1");
    assert_eq!(sim.hw.last_motion(), Some(ActuatorCall::Stop));
    assert!(sim.sink.events.contains(&AppEvent::IntersectionReached {
        node: "A1".try_into().unwrap(),
        step: 0,
    }));

    // Settle, then the turn starts with a forward creep.
    let settled = sim
        .run_until(CROSS, 700, |s| s.state() != RobotState::IntersectionDetected)
        .expect("settle ends");
    assert!(settled >= 500, "settled after {settled} ms");
    assert_eq!(sim.state(), RobotState::ExecutingLeft);
    assert_eq!(sim.app.cursor(), 1);
    assert_eq!(sim.hw.last_motion(), Some(ActuatorCall::Forward));

    sim.run_until(NONE, 300, |s| s.hw.last_motion() == Some(ActuatorCall::HardLeft))
        .expect("commit phase spins left");

    sim.run_until(LOCKED, 1_000, |s| s.state() == RobotState::Forward)
        .expect("line reacquired");

    sim.step(ON_LINE);
    assert_eq!(sim.step(CROSS), RobotState::IntersectionDetected);
    assert_eq!(sim.app.node(), "A2");

    sim.run_until(CROSS, 700, |s| s.state() == RobotState::Arrived)
        .expect("end step arrives");
    assert_eq!(sim.app.node(), "ARRIVED");
    assert!(!sim.app.is_running());
    assert_eq!(sim.hw.last_motion(), Some(ActuatorCall::Stop));
    assert!(sim.sink.events.contains(&AppEvent::Arrived { steps: 2 }));
}

#[test]
fn arrived_ignores_sensors_until_new_path() {
    let mut sim = Sim::new();
    sim.follow("5");
    sim.step(CROSS);
    sim.run_until(CROSS, 700, |s| s.state() == RobotState::Arrived)
        .expect("arrives");
    let calls = sim.hw.calls.len();

    sim.hold(ON_LINE, 200);
    assert_eq!(sim.state(), RobotState::Arrived);
    assert_eq!(sim.hw.calls.len(), calls, "no motion while arrived");

    sim.follow("5");
    assert_eq!(sim.state(), RobotState::Forward);
    assert_eq!(sim.app.cursor(), 0);
}

#[test]
fn exhausted_path_counts_as_arrival() {
    let mut sim = Sim::new();
    sim.follow("4");
    sim.step(CROSS);
    sim.run_until(CROSS, 700, |s| s.state() == RobotState::PassingStraight)
        .expect("straight starts");
    sim.run_until(ON_LINE, 500, |s| s.state() == RobotState::Forward)
        .expect("straight pass ends");

    sim.step(CROSS);
    sim.run_until(CROSS, 700, |s| s.state() == RobotState::Arrived)
        .expect("no more steps means arrived");
    assert_eq!(sim.app.cursor(), 1, "cursor stops at the path length");
}

#[test]
fn straight_pass_does_not_redetect_the_same_intersection() {
    let mut sim = Sim::new();
    sim.follow("45");
    sim.step(CROSS);
    sim.run_until(CROSS, 700, |s| s.state() == RobotState::PassingStraight)
        .expect("straight starts");
    assert_eq!(sim.hw.last_motion(), Some(ActuatorCall::Forward));

    // The cross pattern is still under the robot for most of the pass.
    sim.hold(CROSS, 200);
    assert_eq!(sim.state(), RobotState::PassingStraight);
    assert_eq!(sim.app.cursor(), 1);

    sim.run_until(ON_LINE, 300, |s| s.state() == RobotState::Forward)
        .expect("pass ends on the line");
}

#[test]
fn u_turn_ignores_the_line_it_is_leaving() {
    let mut sim = Sim::new();
    sim.follow("35");
    sim.step(CROSS);
    sim.run_until(CROSS, 700, |s| s.state() == RobotState::ExecutingUTurn)
        .expect("u-turn starts");
    sim.run_until(ON_LINE, 300, |s| s.hw.last_motion() == Some(ActuatorCall::UTurn))
        .expect("spins");

    // Stale line under the sensors: must not count as reacquired.
    sim.hold(LOCKED, 600);
    assert_eq!(sim.state(), RobotState::ExecutingUTurn);

    // Clear of the stale line, then the new one locks.
    sim.hold(NONE, 50);
    sim.run_until(LOCKED, 200, |s| s.state() == RobotState::Forward)
        .expect("new line locks");
}

#[test]
fn lost_turn_times_out_and_stops_off_line() {
    let mut sim = Sim::new();
    sim.follow("25");
    sim.step(CROSS);
    sim.run_until(CROSS, 700, |s| s.state() == RobotState::ExecutingRight)
        .expect("right turn starts");

    let elapsed = sim
        .run_until(NONE, 10_000, |s| s.state() == RobotState::OffLine)
        .expect("times out");
    assert!(elapsed >= 8_000, "timed out after {elapsed} ms");
    assert_eq!(sim.hw.last_motion(), Some(ActuatorCall::Stop));
    assert!(!sim.app.is_running());
    assert!(
        sim.sink
            .events
            .contains(&AppEvent::ReacquireTimeout(TurnKind::Right))
    );

    // Terminal: seeing the line again does not resume navigation.
    sim.hold(ON_LINE, 100);
    assert_eq!(sim.state(), RobotState::OffLine);
}

#[test]
fn malformed_step_is_skipped_and_navigation_continues() {
    let mut sim = Sim::new();
    sim.follow("94");
    sim.step(CROSS);
    sim.run_until(CROSS, 700, |s| s.app.cursor() == 1)
        .expect("malformed step consumed");
    assert!(sim.sink.events.contains(&AppEvent::MalformedStep {
        index: 0,
        code: '9',
    }));

    // Held on the cross with the motors stopped.
    assert_eq!(sim.state(), RobotState::IntersectionDetected);
    assert_eq!(sim.hw.last_motion(), Some(ActuatorCall::Stop));
    let motions_at_skip = sim.hw.motions().len();

    let waited = sim
        .run_until(CROSS, 1_000, |s| s.state() == RobotState::PassingStraight)
        .expect("next step dispatches after a fresh settle");
    assert!(waited >= u64::from(sim.app.config().settle_ms));
    assert_eq!(sim.app.cursor(), 2);
    assert_eq!(
        sim.hw.motions()[motions_at_skip..],
        [ActuatorCall::Forward],
        "no line-following motion while settling"
    );
}

#[test]
fn line_following_corrections_map_to_motions() {
    let mut sim = Sim::new();
    sim.follow("5");
    let cases = [
        ([false, true, false, false, false], ActuatorCall::SoftLeft),
        ([false, false, false, true, false], ActuatorCall::SoftRight),
        ([true, true, false, false, false], ActuatorCall::HardLeft),
        ([false, false, false, true, true], ActuatorCall::HardRight),
        (ON_LINE, ActuatorCall::Forward),
    ];
    for (bits, motion) in cases {
        sim.step(bits);
        assert_eq!(sim.hw.last_motion(), Some(motion), "{bits:?}");
    }
}

#[test]
fn losing_the_line_while_following_stops() {
    let mut sim = Sim::new();
    sim.follow("5");
    assert_eq!(sim.step(NONE), RobotState::OffLine);
    assert_eq!(sim.hw.last_motion(), Some(ActuatorCall::Stop));
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn stop_command_halts_mid_route() {
    let mut sim = Sim::new();
    sim.follow("1245");
    sim.step(ON_LINE);
    sim.app
        .handle_command(AppCommand::Stop, sim.now, &mut sim.hw, &mut sim.sink);

    assert_eq!(sim.state(), RobotState::Idle);
    assert!(!sim.app.is_running());
    assert_eq!(sim.hw.last_motion(), Some(ActuatorCall::Stop));
    assert!(sim.sink.events.contains(&AppEvent::Stopped));

    sim.hold(CROSS, 100);
    assert_eq!(sim.state(), RobotState::Idle, "idle ignores sensors");
}

#[test]
fn new_path_replaces_running_one() {
    let mut sim = Sim::new();
    sim.follow("12");
    sim.step(CROSS);
    sim.run_until(CROSS, 700, |s| s.state() == RobotState::ExecutingLeft)
        .expect("turn starts");

    sim.follow("3");
    assert_eq!(sim.state(), RobotState::Forward);
    assert_eq!(sim.app.cursor(), 0);
    assert_eq!(sim.app.path().to_digits().as_str(), "3");
    assert_eq!(sim.app.node(), "START");

    // The next intersection runs the head of the new path.
    sim.hold(ON_LINE, 50);
    assert_eq!(sim.state(), RobotState::Forward);
    sim.run_until(CROSS, 700, |s| s.state() == RobotState::ExecutingUTurn)
        .expect("new path head dispatched");
    assert_eq!(sim.app.cursor(), 1);
    assert_eq!(sim.app.node(), "A1");
}

#[test]
fn set_speeds_reaches_the_actuator_clamped() {
    let mut sim = Sim::new();
    assert_eq!(sim.hw.calls.first(), Some(&ActuatorCall::SetSpeeds(200, 200, 255)));

    sim.app.handle_command(
        AppCommand::SetSpeeds {
            forward: 300,
            soft: -5,
            hard: 128,
        },
        sim.now,
        &mut sim.hw,
        &mut sim.sink,
    );
    assert_eq!(sim.hw.calls.last(), Some(&ActuatorCall::SetSpeeds(300, -5, 128)));
    assert_eq!(sim.app.config().speed_forward, 255);
    assert_eq!(sim.app.config().speed_soft, 0);
    assert_eq!(sim.app.config().speed_hard, 128);
}
