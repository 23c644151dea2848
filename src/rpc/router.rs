//! Command router: turns protocol lines into application commands.
//!
//! The router owns the transport and the line decoder.  Each call to
//! [`CommandRouter::handle_incoming`] does at most one non-blocking read
//! and dispatches at most one frame, so a burst of commands is spread
//! across control-loop cycles and navigation keeps its cadence.
//!
//! Every dispatched frame gets exactly one response line.  Response bytes
//! the transport does not take at once stay queued and go out ahead of
//! the next response, so lines never interleave on the stream.  Commands the
//! navigation core does not execute itself (tasks, manual device control,
//! node-based moves) are acknowledged and forwarded as
//! [`AppEvent`]s for their collaborators.

use log::{debug, info, warn};

use crate::app::commands::AppCommand;
use crate::app::events::{AppEvent, TelemetryData};
use crate::app::ports::{ActuatorPort, EventSink};
use crate::app::service::AppService;
use crate::error::ProtocolError;

use super::codec::{LineDecoder, encode_line};
use super::protocol::{
    Command, DeviceState, MSG_MANUAL_ACK, MSG_PATH_STARTED, MSG_TARGET_ACK, MSG_TASK_ACK,
    MoveTarget, Response, TelemetryFrame, decode_command,
};
use super::transport::Transport;

/// Cap on queued response bytes.  A response that does not fit is
/// dropped whole.
pub const MAX_OUTBOUND: usize = 4 * 1024;

/// Protocol front end over a [`Transport`].
pub struct CommandRouter<T: Transport> {
    transport: T,
    decoder: LineDecoder,
    /// Encoded response lines not yet accepted by the transport.
    outbound: Vec<u8>,
}

impl<T: Transport> CommandRouter<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: LineDecoder::new(),
            outbound: Vec::with_capacity(256),
        }
    }

    /// Poll the transport once and handle at most one complete line.
    ///
    /// Returns the response sent, or `None` when no line was ready.
    pub fn handle_incoming(
        &mut self,
        app: &mut AppService,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> Option<Response> {
        self.drain_outbound();
        self.poll_transport();

        let response = match self.decoder.next_frame()? {
            Ok(frame) => self.dispatch(&frame, app, hw, sink, now_ms),
            Err(err) => {
                warn!("Router: dropped inbound frame: {}", err);
                Response::fail(err)
            }
        };
        self.send_response(&response);
        Some(response)
    }

    /// Decode one line and act on it.  Never touches navigation state
    /// when decoding fails.
    pub fn dispatch(
        &mut self,
        line: &[u8],
        app: &mut AppService,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> Response {
        let cmd = match decode_command(line) {
            Ok(cmd) => cmd,
            Err(err) => {
                log_rejected(line, err);
                return Response::fail(err);
            }
        };

        match cmd {
            Command::Move(MoveTarget::Path(path)) => {
                info!("Router: MOVE path {}", path.to_digits());
                app.handle_command(AppCommand::FollowPath(path), now_ms, hw, sink);
                Response::success(MSG_PATH_STARTED)
            }
            Command::Move(MoveTarget::Node(node)) => {
                info!("Router: MOVE target_node {} (acknowledged only)", node);
                sink.emit(&AppEvent::TargetNodeRequested(node));
                Response::success(MSG_TARGET_ACK)
            }
            Command::Task { action, count } => {
                info!("Router: TASK {} x{}", action, count);
                sink.emit(&AppEvent::TaskRequested { action, count });
                Response::success(MSG_TASK_ACK)
            }
            Command::Manual { device, state } => {
                info!("Router: MANUAL {} {:?}", device, state);
                sink.emit(&AppEvent::DeviceRequested {
                    device,
                    on: state == DeviceState::On,
                });
                Response::success(MSG_MANUAL_ACK)
            }
        }
    }

    /// Queue one response line and push as much of the backlog as the
    /// transport takes.
    pub fn send_response(&mut self, response: &Response) {
        let payload = match serde_json::to_vec(response) {
            Ok(p) => p,
            Err(e) => {
                warn!("Router: response encode failed: {}", e);
                return;
            }
        };
        if self.outbound.len() + payload.len() + 1 > MAX_OUTBOUND {
            warn!(
                "Router: {} response bytes still queued, dropping {:?}",
                self.outbound.len(),
                response.status
            );
            return;
        }
        encode_line(&payload, &mut self.outbound);
        self.drain_outbound();
    }

    /// Send one telemetry datagram.  Failures are logged and dropped.
    pub fn broadcast_telemetry(&mut self, data: &TelemetryData) {
        let frame = TelemetryFrame::from(data);
        let payload = match serde_json::to_vec(&frame) {
            Ok(p) => p,
            Err(e) => {
                warn!("Router: telemetry encode failed: {}", e);
                return;
            }
        };
        match self.transport.broadcast(&payload) {
            Ok(()) => debug!("Router: telemetry sent ({} bytes)", payload.len()),
            Err(e) => warn!("Router: telemetry send failed: {:?}", e),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Response bytes waiting for the transport.
    pub fn pending_output(&self) -> usize {
        self.outbound.len()
    }

    /// Forget the partial inbound line and any unsent response bytes.
    /// Call whenever the transport opens a new connection.
    pub fn reset_link(&mut self) {
        if self.decoder.buffered() > 0 || !self.outbound.is_empty() {
            info!(
                "Router: link reset, dropped {} inbound and {} outbound bytes",
                self.decoder.buffered(),
                self.outbound.len()
            );
        }
        self.decoder.reset();
        self.outbound.clear();
    }

    // ── Internal ──────────────────────────────────────────────

    /// One non-blocking read into the decoder's spare space.
    fn poll_transport(&mut self) {
        if self.decoder.spare().is_empty() {
            return;
        }
        match self.transport.read(self.decoder.spare()) {
            Ok(n) => self.decoder.commit(n),
            Err(e) => {
                warn!("Router: transport read failed: {:?}", e);
                self.reset_link();
            }
        }
    }

    /// Write queued response bytes until the backlog is empty or the
    /// transport stops taking them.  A write error means the connection
    /// is gone, and its unsent bytes go with it.
    fn drain_outbound(&mut self) {
        let mut sent = 0;
        while sent < self.outbound.len() {
            match self.transport.write(&self.outbound[sent..]) {
                Ok(0) => break,
                Ok(n) => sent += n.min(self.outbound.len() - sent),
                Err(e) => {
                    warn!("Router: response write failed: {:?}", e);
                    self.reset_link();
                    return;
                }
            }
        }
        if sent == 0 {
            return;
        }
        self.outbound.drain(..sent);
        if let Err(e) = self.transport.flush() {
            warn!("Router: flush failed: {:?}", e);
        }
    }
}

fn log_rejected(line: &[u8], err: ProtocolError) {
    let shown = &line[..line.len().min(96)];
    warn!(
        "Router: rejected {:?}: {}",
        String::from_utf8_lossy(shown),
        err
    );
}
