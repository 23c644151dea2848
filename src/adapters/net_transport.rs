//! TCP + UDP transport adapter.
//!
//! Implements [`Transport`] over `std::net`, which ESP-IDF backs with
//! lwIP, so the same code runs on the robot and on the host:
//!
//! - commands and responses: one TCP stream to the control server,
//!   non-blocking, `read()` returns `Ok(0)` when nothing is pending;
//! - telemetry: UDP datagrams to the server's telemetry port.
//!
//! ## Connection model
//!
//! 1. `connect()` binds the UDP socket and opens the TCP stream.
//! 2. When the peer closes or the stream errors, the stream is dropped
//!    and the transport reports `Disconnected` once; later reads are
//!    quiet `Ok(0)` so the control loop keeps polling.
//! 3. The owner calls [`reconnect()`](NetTransport::reconnect) on its
//!    own schedule.  It blocks for up to `CONNECT_TIMEOUT`, so the
//!    binary only calls it while the robot is stopped.  Telemetry keeps
//!    flowing while the stream is down.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::time::Duration;

use log::{info, warn};

use crate::error::TransportError;
use crate::rpc::transport::Transport;

/// Upper bound on a blocking TCP connect attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// TCP command stream plus UDP telemetry socket.
pub struct NetTransport {
    command_addr: SocketAddr,
    telemetry_addr: SocketAddr,
    stream: Option<TcpStream>,
    udp: UdpSocket,
}

impl NetTransport {
    /// Bind the telemetry socket and open the command stream.
    ///
    /// A failed TCP connect is not fatal: the transport starts
    /// disconnected and can be retried with [`reconnect`](Self::reconnect).
    pub fn connect(
        command_addr: SocketAddr,
        telemetry_addr: SocketAddr,
    ) -> Result<Self, TransportError> {
        let bind: SocketAddr = if telemetry_addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let udp = UdpSocket::bind(bind)?;
        udp.set_nonblocking(true)?;

        let mut transport = Self {
            command_addr,
            telemetry_addr,
            stream: None,
            udp,
        };
        if let Err(e) = transport.reconnect() {
            warn!("NET: command stream unavailable at start: {}", e);
        }
        Ok(transport)
    }

    /// (Re)open the command stream.  No-op when already connected.
    pub fn reconnect(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect_timeout(&self.command_addr, CONNECT_TIMEOUT)
            .map_err(|_| TransportError::ConnectFailed)?;
        stream.set_nonblocking(true)?;
        // Responses are small and latency matters more than batching.
        let _ = stream.set_nodelay(true);
        info!("NET: connected to {}", self.command_addr);
        self.stream = Some(stream);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn drop_stream(&mut self, why: &str) {
        if self.stream.take().is_some() {
            warn!("NET: command stream closed ({})", why);
        }
    }
}

impl Transport for NetTransport {
    type Error = TransportError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };
        match stream.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.drop_stream("EOF");
                Err(TransportError::Disconnected)
            }
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(ref e) if e.kind() == ErrorKind::Interrupted => Ok(0),
            Err(e) => {
                self.drop_stream("read error");
                Err(e.into())
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::Disconnected)?;
        match stream.write(data) {
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => {
                self.drop_stream("write error");
                Err(e.into())
            }
        }
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush().map_err(Into::into),
            None => Err(TransportError::Disconnected),
        }
    }

    fn broadcast(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        self.udp.send_to(datagram, self.telemetry_addr)?;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests (host loopback)
// ───────────────────────────────────────────────────────────────
