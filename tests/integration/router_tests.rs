//! Integration tests for the command router: transport bytes in,
//! response lines out, commands applied to the app core.

use serde_json::json;

use super::mock_hw::{MockHardware, MockTransport, RecordingSink};

use nursery_agv::app::events::AppEvent;
use nursery_agv::app::service::AppService;
use nursery_agv::config::SystemConfig;
use nursery_agv::fsm::RobotState;
use nursery_agv::rpc::protocol::{MSG_PATH_STARTED, MSG_TASK_ACK, Response, Status};
use nursery_agv::rpc::router::{CommandRouter, MAX_OUTBOUND};

struct Rig {
    router: CommandRouter<MockTransport>,
    app: AppService,
    hw: MockHardware,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let mut rig = Self {
            router: CommandRouter::new(MockTransport::new()),
            app: AppService::new(SystemConfig::default()),
            hw: MockHardware::new(),
            sink: RecordingSink::new(),
        };
        rig.app.start(0, &mut rig.hw, &mut rig.sink);
        rig
    }

    fn send(&mut self, line: &str) {
        self.router.transport_mut().push_line(line);
    }

    fn poll(&mut self) -> Option<Response> {
        self.router
            .handle_incoming(&mut self.app, &mut self.hw, &mut self.sink, 0)
    }

    /// Send one line and return the parsed response written for it.
    fn exchange(&mut self, line: &str) -> serde_json::Value {
        self.send(line);
        self.poll().expect("a response");
        self.router
            .transport()
            .responses()
            .pop()
            .expect("response written")
    }
}

fn fail(msg: &str) -> serde_json::Value {
    json!({ "status": "FAIL", "msg": msg })
}

// ── MOVE ──────────────────────────────────────────────────────

#[test]
fn move_path_starts_navigation() {
    let mut rig = Rig::new();
    let reply = rig.exchange(r#"{"cmd":"MOVE","path":"1435"}"#);

    assert_eq!(reply, json!({ "status": "SUCCESS", "msg": MSG_PATH_STARTED }));
    assert_eq!(rig.app.state(), RobotState::Forward);
    assert_eq!(rig.app.path().to_digits().as_str(), "1435");
    assert!(rig.sink.events.contains(&AppEvent::PathAssigned { steps: 4 }));
}

#[test]
fn path_takes_precedence_over_target_node() {
    let mut rig = Rig::new();
    let reply = rig.exchange(r#"{"cmd":"MOVE","path":"2","target_node":"B7"}"#);
    assert_eq!(reply["status"], "SUCCESS");
    assert_eq!(rig.app.path().to_digits().as_str(), "2");
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::TargetNodeRequested(_))),
        0
    );
}

#[test]
fn target_node_is_acknowledged_without_moving() {
    let mut rig = Rig::new();
    let reply = rig.exchange(r#"{"cmd":"MOVE","target_node":"NODE-A1-001"}"#);

    assert_eq!(reply["status"], "SUCCESS");
    assert_eq!(rig.app.state(), RobotState::Idle);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::TargetNodeRequested("NODE-A1-001".try_into().unwrap()))
    );
}

#[test]
fn move_without_destination_fails() {
    let mut rig = Rig::new();
    let reply = rig.exchange(r#"{"cmd":"MOVE"}"#);
    assert_eq!(reply, fail("path or target_node field required"));
    assert_eq!(rig.app.state(), RobotState::Idle);
}

#[test]
fn empty_and_oversized_paths_fail() {
    let mut rig = Rig::new();
    assert_eq!(
        rig.exchange(r#"{"cmd":"MOVE","path":""}"#),
        fail("path is empty")
    );

    let long = format!(r#"{{"cmd":"MOVE","path":"{}"}}"#, "1".repeat(65));
    assert_eq!(rig.exchange(&long), fail("path too long"));
    assert_eq!(rig.app.state(), RobotState::Idle);
    assert!(!rig.app.is_running());
}

// ── Rejections leave navigation alone ─────────────────────────

#[test]
fn unknown_command_does_not_disturb_a_running_route() {
    let mut rig = Rig::new();
    rig.exchange(r#"{"cmd":"MOVE","path":"12"}"#);
    let before = (rig.app.state(), rig.app.cursor(), rig.hw.calls.len());

    assert_eq!(
        rig.exchange(r#"{"cmd":"DANCE","speed":3}"#),
        fail("unknown command")
    );
    assert_eq!(
        (rig.app.state(), rig.app.cursor(), rig.hw.calls.len()),
        before
    );
    assert_eq!(rig.app.path().to_digits().as_str(), "12");
}

#[test]
fn invalid_json_is_a_parse_failure() {
    let mut rig = Rig::new();
    assert_eq!(rig.exchange("{not json"), fail("JSON parse failed"));
    assert_eq!(rig.exchange(r#"{"path":"12"}"#), fail("JSON parse failed"));
    assert_eq!(
        rig.exchange(r#"{"cmd":"MANUAL","device":"FAN","state":"DIM"}"#),
        fail("JSON parse failed")
    );
}

// ── TASK / MANUAL ─────────────────────────────────────────────

#[test]
fn task_is_forwarded_with_default_count() {
    let mut rig = Rig::new();
    let reply = rig.exchange(r#"{"cmd":"TASK","action":"PICK_AND_PLACE"}"#);
    assert_eq!(reply["status"], "SUCCESS");
    assert!(rig.sink.events.contains(&AppEvent::TaskRequested {
        action: "PICK_AND_PLACE".try_into().unwrap(),
        count: 1,
    }));

    rig.exchange(r#"{"cmd":"TASK","action":"WATER","count":5}"#);
    assert!(rig.sink.events.contains(&AppEvent::TaskRequested {
        action: "WATER".try_into().unwrap(),
        count: 5,
    }));
    assert_eq!(rig.app.state(), RobotState::Idle);
}

#[test]
fn manual_switch_is_forwarded() {
    let mut rig = Rig::new();
    let reply = rig.exchange(r#"{"cmd":"MANUAL","device":"FAN","state":"ON"}"#);
    assert_eq!(reply["status"], "SUCCESS");
    rig.exchange(r#"{"cmd":"MANUAL","device":"LIGHT","state":"OFF"}"#);

    assert!(rig.sink.events.contains(&AppEvent::DeviceRequested {
        device: "FAN".try_into().unwrap(),
        on: true,
    }));
    assert!(rig.sink.events.contains(&AppEvent::DeviceRequested {
        device: "LIGHT".try_into().unwrap(),
        on: false,
    }));
}

// ── Framing ───────────────────────────────────────────────────

#[test]
fn idle_transport_writes_nothing() {
    let mut rig = Rig::new();
    assert_eq!(rig.poll(), None);
    assert!(rig.router.transport().written.is_empty());
}

#[test]
fn line_split_across_reads_is_reassembled() {
    let mut rig = Rig::new();
    rig.router.transport_mut().chunk = 5;
    rig.send(r#"{"cmd":"MOVE","path":"4"}"#);

    let mut polls = 0;
    let response = loop {
        polls += 1;
        if let Some(r) = rig.poll() {
            break r;
        }
        assert!(polls < 20, "line never completed");
    };
    assert!(polls > 1);
    assert_eq!(response.status, Status::Success);
    assert_eq!(rig.app.state(), RobotState::Forward);
}

#[test]
fn one_message_per_poll() {
    let mut rig = Rig::new();
    rig.send(r#"{"cmd":"TASK","action":"A"}"#);
    rig.send(r#"{"cmd":"TASK","action":"B"}"#);

    assert!(rig.poll().is_some());
    assert_eq!(rig.router.transport().responses().len(), 1);
    assert!(rig.poll().is_some());
    assert_eq!(rig.router.transport().responses().len(), 2);
    assert_eq!(rig.poll(), None);
}

#[test]
fn crlf_terminated_lines_are_accepted() {
    let mut rig = Rig::new();
    rig.router
        .transport_mut()
        .push(b"{\"cmd\":\"MOVE\",\"path\":\"5\"}\r\n");
    assert_eq!(rig.poll().map(|r| r.status), Some(Status::Success));
}

#[test]
fn oversized_line_is_rejected_and_the_stream_recovers() {
    let mut rig = Rig::new();
    let junk = "a".repeat(1_500);
    rig.send(&junk);
    rig.send(r#"{"cmd":"MOVE","path":"1"}"#);

    assert_eq!(
        rig.poll(),
        Some(Response {
            status: Status::Fail,
            msg: "frame too long",
        })
    );
    assert_eq!(rig.poll().map(|r| r.status), Some(Status::Success));
    assert_eq!(rig.app.state(), RobotState::Forward);
}

// ── Link ──────────────────────────────────────────────────────

#[test]
fn short_writes_never_merge_response_lines() {
    let mut rig = Rig::new();
    rig.router.transport_mut().write_budget = Some(20);

    rig.send(r#"{"cmd":"TASK","action":"A"}"#);
    assert!(rig.poll().is_some());
    assert_eq!(rig.router.transport().written.len(), 20);
    assert!(rig.router.pending_output() > 0);

    rig.send(r#"{"cmd":"TASK","action":"B"}"#);
    assert!(rig.poll().is_some());
    assert_eq!(rig.router.transport().written.len(), 20);

    // Stream drains on the next cycle, in order, one response per line.
    rig.router.transport_mut().write_budget = None;
    assert_eq!(rig.poll(), None);
    assert_eq!(rig.router.pending_output(), 0);
    let responses = rig.router.transport().responses();
    assert_eq!(responses.len(), 2);
    for r in responses {
        assert_eq!(r, json!({ "status": "SUCCESS", "msg": MSG_TASK_ACK }));
    }
}

#[test]
fn full_backlog_drops_whole_responses() {
    let mut rig = Rig::new();
    rig.router.transport_mut().write_budget = Some(0);
    for i in 0..100 {
        rig.send(&format!(r#"{{"cmd":"TASK","action":"T{i}"}}"#));
        assert!(rig.poll().is_some());
        assert!(rig.router.pending_output() <= MAX_OUTBOUND);
    }

    rig.router.transport_mut().write_budget = None;
    rig.poll();
    let line_len = serde_json::to_vec(&Response::success(MSG_TASK_ACK))
        .unwrap()
        .len()
        + 1;
    let responses = rig.router.transport().responses();
    assert_eq!(responses.len(), MAX_OUTBOUND / line_len);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::TaskRequested { .. })), 100);
}

#[test]
fn reconnect_discards_the_stale_partial_line() {
    let mut rig = Rig::new();
    rig.router.transport_mut().push(br#"{"cmd":"MO"#);
    assert_eq!(rig.poll(), None);

    rig.router.reset_link();
    rig.send(r#"{"cmd":"MOVE","path":"14"}"#);
    assert_eq!(rig.poll(), Some(Response::success(MSG_PATH_STARTED)));
    assert_eq!(rig.app.state(), RobotState::Forward);
}

#[test]
fn dropped_stream_discards_the_stale_partial_line() {
    let mut rig = Rig::new();
    rig.router.transport_mut().push(br#"{"cmd":"MO"#);
    assert_eq!(rig.poll(), None);

    rig.router.transport_mut().drop_stream = true;
    assert_eq!(rig.poll(), None);

    rig.send(r#"{"cmd":"MOVE","path":"14"}"#);
    assert_eq!(rig.poll(), Some(Response::success(MSG_PATH_STARTED)));
    assert_eq!(rig.app.state(), RobotState::Forward);
}
