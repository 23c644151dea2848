//! Newline-delimited frame codec.
//!
//! Wire format: one JSON document per line.
//! ```text
//! ┌──────────────────────────────┬──────┐
//! │ UTF-8 JSON payload (≤ 1 KiB) │ '\n' │
//! └──────────────────────────────┴──────┘
//! ```
//!
//! The decoder accumulates incoming bytes into a fixed buffer and yields
//! complete lines.  A single `Transport::read` call may return part of a
//! line or several lines concatenated; lines are handed out one at a time.
//! A trailing `'\r'` is trimmed and blank lines are skipped.

use crate::error::ProtocolError;

/// Maximum frame payload size, newline excluded.
pub const MAX_FRAME_LEN: usize = 1024;

/// Receive buffer size.  Twice the frame limit so a full frame and the
/// start of the next one fit together.
const RX_BUFFER_SIZE: usize = 2 * MAX_FRAME_LEN;

/// One complete line, terminator stripped.
pub type Frame = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Streaming line decoder.
pub struct LineDecoder {
    buf: [u8; RX_BUFFER_SIZE],
    len: usize,
    /// An overlong line was reported; drop bytes up to its newline.
    discarding: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buf: [0; RX_BUFFER_SIZE],
            len: 0,
            discarding: false,
        }
    }

    /// Free space at the end of the buffer, for a transport to read into.
    /// Follow with [`commit`](Self::commit).
    pub fn spare(&mut self) -> &mut [u8] {
        &mut self.buf[self.len..]
    }

    /// Mark `n` bytes of [`spare`](Self::spare) as filled.
    pub fn commit(&mut self, n: usize) {
        self.len = (self.len + n).min(RX_BUFFER_SIZE);
    }

    /// Copy bytes into the buffer.  Returns how many were accepted; the
    /// rest must be fed again after frames have been taken out.
    pub fn feed(&mut self, data: &[u8]) -> usize {
        let spare = self.spare();
        let n = data.len().min(spare.len());
        spare[..n].copy_from_slice(&data[..n]);
        self.commit(n);
        n
    }

    /// Take the next complete line out of the buffer.
    ///
    /// Returns `None` when no complete line is buffered,
    /// `Some(Err(FrameTooLong))` once per overlong line.
    pub fn next_frame(&mut self) -> Option<Result<Frame, ProtocolError>> {
        loop {
            let newline = self.buf[..self.len].iter().position(|&b| b == b'\n');

            if self.discarding {
                match newline {
                    Some(i) => {
                        self.consume(i + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        self.len = 0;
                        return None;
                    }
                }
            }

            let Some(i) = newline else {
                // A full-size payload may still be waiting on the '\n' of
                // its "\r\n" terminator.
                let limit = if self.buf[..self.len].ends_with(b"\r") {
                    MAX_FRAME_LEN + 1
                } else {
                    MAX_FRAME_LEN
                };
                if self.len > limit {
                    // No terminator in sight and already too long.
                    self.len = 0;
                    self.discarding = true;
                    return Some(Err(ProtocolError::FrameTooLong));
                }
                return None;
            };

            let mut end = i;
            if end > 0 && self.buf[end - 1] == b'\r' {
                end -= 1;
            }

            let result = if end > MAX_FRAME_LEN {
                Some(Err(ProtocolError::FrameTooLong))
            } else if self.buf[..end].iter().all(u8::is_ascii_whitespace) {
                None
            } else {
                Frame::from_slice(&self.buf[..end]).ok().map(Ok)
            };
            self.consume(i + 1);

            if result.is_some() {
                return result;
            }
        }
    }

    /// Bytes currently buffered (incomplete line included).
    pub fn buffered(&self) -> usize {
        self.len
    }

    /// Drop all buffered bytes.  Used when the link reconnects.
    pub fn reset(&mut self) {
        self.len = 0;
        self.discarding = false;
    }

    fn consume(&mut self, n: usize) {
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
    }
}

/// Terminate an encoded payload with `'\n'` for the stream.
pub fn encode_line(payload: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(payload);
    out.push(b'\n');
}
