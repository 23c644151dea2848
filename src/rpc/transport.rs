//! Transport abstraction: a byte stream plus a datagram side channel.
//!
//! Concrete implementations:
//! - [`NetTransport`](crate::adapters::net_transport::NetTransport):
//!   TCP stream for commands, UDP datagrams for telemetry (over Wi-Fi)
//! - `MockTransport` in the integration tests
//!
//! The command router is generic over `Transport`, so adding a new
//! transport requires zero changes to the protocol logic.

/// Byte-oriented command channel with a connectionless broadcast side.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the command stream.
    /// Returns the number of bytes actually written; 0 when the stream
    /// cannot take more right now.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Send one datagram on the telemetry channel.  Best effort: a lost
    /// datagram is not retried.
    fn broadcast(&mut self, datagram: &[u8]) -> Result<(), Self::Error>;
}

/// A null transport that discards all writes and never reads.
/// Useful as a default when no control server is reachable.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn broadcast(&mut self, _datagram: &[u8]) -> Result<(), ()> {
        Ok(())
    }
}
