//! Error types for the command protocol and the network link.
//!
//! All variants are `Copy` so they pass through the router and control
//! loop without allocation.  The device binary lifts them into `anyhow`
//! with `?`.

use core::fmt;

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Failures of the inbound command protocol.  Each maps to exactly one
/// `FAIL` response message; none of them touches navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload is not valid JSON or does not match the command's shape.
    Malformed,
    /// The `cmd` discriminator names no known command.
    UnknownCommand,
    /// `MOVE` carried neither `path` nor `target_node`.
    MissingField,
    /// A frame exceeded the receive limit before its newline arrived.
    FrameTooLong,
    /// `MOVE` carried an empty `path`.
    EmptyPath,
    /// `MOVE` carried more path steps than the route can hold.
    PathTooLong,
}

impl ProtocolError {
    /// Text placed in the `msg` field of the `FAIL` response.
    pub const fn response_msg(self) -> &'static str {
        match self {
            Self::Malformed => "JSON parse failed",
            Self::UnknownCommand => "unknown command",
            Self::MissingField => "path or target_node field required",
            Self::FrameTooLong => "frame too long",
            Self::EmptyPath => "path is empty",
            Self::PathTooLong => "path too long",
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.response_msg())
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Could not open the command stream or telemetry socket.
    ConnectFailed,
    /// The peer closed the command stream.
    Disconnected,
    /// Any other socket error.
    Io(std::io::ErrorKind),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::Disconnected => write!(f, "peer disconnected"),
            Self::Io(kind) => write!(f, "I/O error ({kind})"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.kind())
    }
}
