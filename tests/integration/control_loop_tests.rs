//! Integration tests for the cooperative control loop: navigation,
//! inbound commands and telemetry sharing one polling cycle.

use super::mock_hw::{
    ActuatorCall, CROSS, MockHardware, MockTransport, NONE, ON_LINE, RecordingSink,
};

use nursery_agv::app::events::{AppEvent, RobotStatus};
use nursery_agv::config::SystemConfig;
use nursery_agv::control_loop::ControlLoop;
use nursery_agv::fsm::RobotState;
use nursery_agv::rpc::protocol::Status;

const LOOP_MS: u64 = 10;

fn make_loop() -> (ControlLoop<MockTransport>, MockHardware, RecordingSink) {
    let mut control = ControlLoop::new(SystemConfig::default(), MockTransport::new());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    control.start(0, &mut hw, &mut sink);
    (control, hw, sink)
}

fn run_for(
    control: &mut ControlLoop<MockTransport>,
    hw: &mut MockHardware,
    sink: &mut RecordingSink,
    from_ms: u64,
    to_ms: u64,
) {
    let mut now = from_ms;
    while now < to_ms {
        now += LOOP_MS;
        control.run_cycle(now, hw, sink);
    }
}

#[test]
fn telemetry_follows_the_configured_interval() {
    let (mut control, mut hw, mut sink) = make_loop();
    run_for(&mut control, &mut hw, &mut sink, 0, 3_000);

    assert_eq!(control.telemetry_sent(), 3);
    assert_eq!(control.router().transport().datagrams.len(), 3);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Telemetry(_))),
        3
    );
}

#[test]
fn telemetry_datagram_carries_robot_state() {
    let (mut control, mut hw, mut sink) = make_loop();
    control.set_status(RobotStatus {
        pos_x: 12,
        pos_y: -3,
        battery: 87,
    });
    control
        .router_mut()
        .transport_mut()
        .push_line(r#"{"cmd":"MOVE","path":"5"}"#);
    hw.set_sensors(ON_LINE);
    run_for(&mut control, &mut hw, &mut sink, 0, 1_000);

    let frames = control.router().transport().telemetry();
    assert_eq!(frames.len(), 1);
    let t = &frames[0];
    assert_eq!(t["type"], "ROBOT_STATE");
    assert_eq!(t["robot_id"], "R01");
    assert_eq!(t["pos_x"], 12);
    assert_eq!(t["pos_y"], -3);
    assert_eq!(t["battery"], 87);
    assert_eq!(t["state"], RobotState::Forward.code());
    assert_eq!(t["node"], "START");
    assert_eq!(t["sensors"], serde_json::json!([0, 0, 1, 0, 0]));
}

#[test]
fn idle_robot_reports_placeholder_node() {
    let (mut control, mut hw, mut sink) = make_loop();
    run_for(&mut control, &mut hw, &mut sink, 0, 1_000);

    let t = &control.router().transport().telemetry()[0];
    assert_eq!(t["state"], 0);
    assert_eq!(t["node"], "-");
}

#[test]
fn command_is_answered_within_one_cycle() {
    let (mut control, mut hw, mut sink) = make_loop();
    control
        .router_mut()
        .transport_mut()
        .push_line(r#"{"cmd":"MOVE","path":"45"}"#);
    hw.set_sensors(ON_LINE);

    let response = control.run_cycle(LOOP_MS, &mut hw, &mut sink);
    assert_eq!(response.map(|r| r.status), Some(Status::Success));
    assert_eq!(control.app().state(), RobotState::Forward);
    assert_eq!(hw.last_motion(), Some(ActuatorCall::Forward));

    assert_eq!(control.run_cycle(2 * LOOP_MS, &mut hw, &mut sink), None);
}

#[test]
fn navigation_keeps_running_while_commands_arrive() {
    let (mut control, mut hw, mut sink) = make_loop();
    control
        .router_mut()
        .transport_mut()
        .push_line(r#"{"cmd":"MOVE","path":"5"}"#);
    hw.set_sensors(ON_LINE);
    run_for(&mut control, &mut hw, &mut sink, 0, 50);

    for i in 0..10 {
        control
            .router_mut()
            .transport_mut()
            .push_line(&format!(r#"{{"cmd":"TASK","action":"T{i}"}}"#));
    }
    hw.set_sensors(CROSS);
    run_for(&mut control, &mut hw, &mut sink, 50, 700);

    assert_eq!(control.app().state(), RobotState::Arrived);
    assert_eq!(control.router().transport().responses().len(), 11);
}

#[test]
fn restart_measures_telemetry_from_the_new_start() {
    let (mut control, mut hw, mut sink) = make_loop();
    control.start(5_000, &mut hw, &mut sink);
    run_for(&mut control, &mut hw, &mut sink, 5_000, 5_990);
    assert_eq!(control.telemetry_sent(), 0);
    run_for(&mut control, &mut hw, &mut sink, 5_990, 6_000);
    assert_eq!(control.telemetry_sent(), 1);
}

#[test]
fn blocking_is_allowed_only_while_stopped() {
    let (mut control, mut hw, mut sink) = make_loop();
    assert!(control.can_block(), "idle");

    control
        .router_mut()
        .transport_mut()
        .push_line(r#"{"cmd":"MOVE","path":"5"}"#);
    hw.set_sensors(ON_LINE);
    run_for(&mut control, &mut hw, &mut sink, 0, 50);
    assert_eq!(control.app().state(), RobotState::Forward);
    assert!(!control.can_block(), "following a route");

    hw.set_sensors(CROSS);
    run_for(&mut control, &mut hw, &mut sink, 50, 700);
    assert_eq!(control.app().state(), RobotState::Arrived);
    assert!(control.can_block(), "arrived");
    assert_eq!(hw.last_motion(), Some(ActuatorCall::Stop));
}

#[test]
fn line_lost_allows_blocking() {
    let (mut control, mut hw, mut sink) = make_loop();
    control
        .router_mut()
        .transport_mut()
        .push_line(r#"{"cmd":"MOVE","path":"1"}"#);
    hw.set_sensors(NONE);
    run_for(&mut control, &mut hw, &mut sink, 0, 30);
    assert_eq!(control.app().state(), RobotState::OffLine);
    assert!(control.can_block());
}
