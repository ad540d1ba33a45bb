//! Protocol codec
//!
//! Framing and encoding for the text protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! SET hello world\r\n
//! ```
//! A command is one line ending in `\n` (a trailing `\r` is dropped). Lines
//! are reassembled across reads by [`LineDecoder`], so one read may carry
//! several commands or part of one. A line that reaches the limit without a
//! terminator is rejected as a whole.
//!
//! ### Response
//! - success: JSON of the payload, e.g. `"world"` or `["hello","world"]`
//! - failure: the error description as plain text, e.g.
//!   `there is no item with key of missing`
//!
//! Every response ends with `\n`, one response per command line.

use std::io::{BufRead, ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};

use crate::error::{LodeError, Result};
use super::{Payload, Response};

/// Default size of a single socket read on the server, and of the longest
/// accepted command line
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Size of the buffer a client reads a response into
pub const RESPONSE_BUFFER_SIZE: usize = 64 * 1024;

/// Terminator appended to every request line
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

// =============================================================================
// Framing
// =============================================================================

/// Terminator appended to every response
pub const RESPONSE_TERMINATOR: u8 = b'\n';

/// One unit of client input, as handed to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A complete command line, without its terminator
    Command(String),

    /// A line of `limit` bytes or more; its bytes were dropped
    TooLong { limit: usize },
}

/// Reassembles command lines from socket reads
///
/// Bytes after the last `\n` are held until more data arrives or
/// [`LineDecoder::flush`] is called. A line that reaches `limit` bytes is
/// reported once as [`Line::TooLong`] and everything up to its `\n` is
/// skipped.
#[derive(Debug)]
pub struct LineDecoder {
    limit: usize,

    /// Start of a line whose terminator has not arrived yet
    pending: BytesMut,

    /// Inside an over-long line, skipping to its end
    discarding: bool,
}

impl LineDecoder {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            pending: BytesMut::new(),
            discarding: false,
        }
    }

    /// Feed the bytes of one read; returns every line they complete
    pub fn decode(&mut self, mut chunk: &[u8]) -> Vec<Line> {
        let mut lines = Vec::new();

        if self.discarding {
            match chunk.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.discarding = false;
                    chunk = &chunk[end + 1..];
                }
                None => return lines,
            }
        }

        self.pending.extend_from_slice(chunk);
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let line = self.pending.split_to(end + 1);
            if end >= self.limit {
                lines.push(Line::TooLong { limit: self.limit });
            } else {
                lines.push(Line::Command(line_text(&line[..end])));
            }
        }

        if self.pending.len() >= self.limit {
            self.pending.clear();
            self.discarding = true;
            lines.push(Line::TooLong { limit: self.limit });
        }
        lines
    }

    /// Hand out a held partial line as a command
    ///
    /// Called when the client goes quiet or closes the stream, for clients
    /// that do not terminate their last line.
    pub fn flush(&mut self) -> Option<Line> {
        if self.discarding || self.pending.is_empty() {
            return None;
        }
        let line = self.pending.split();
        Some(Line::Command(line_text(&line)))
    }

    /// Whether bytes of an unfinished line are held
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn line_text(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Read once; `Ok(None)` when the peer has closed the stream
pub fn read_frame<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<Option<Bytes>> {
    loop {
        match reader.read(buf) {
            Ok(0) => return Ok(None),
            Ok(n) => return Ok(Some(Bytes::copy_from_slice(&buf[..n]))),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes, terminator included
///
/// JSON never contains a raw newline; error texts have theirs replaced by
/// spaces.
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let mut bytes = match response {
        Response::Ok(payload) => serde_json::to_vec(payload)?,
        Response::Error(message) => message
            .replace(|c: char| c == '\r' || c == '\n', " ")
            .into_bytes(),
    };
    bytes.push(RESPONSE_TERMINATOR);
    Ok(bytes)
}

/// Decode one response, with or without its terminator
///
/// Anything that is not a JSON string or array of strings is an error text.
pub fn decode_response(bytes: &[u8]) -> Response {
    let bytes = bytes.strip_suffix(&[RESPONSE_TERMINATOR]).unwrap_or(bytes);
    match serde_json::from_slice::<Payload>(bytes) {
        Ok(payload) => Response::Ok(payload),
        Err(_) => Response::Error(String::from_utf8_lossy(bytes).into_owned()),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a command line, terminated by CRLF
pub fn write_command<W: Write>(writer: &mut W, line: &str) -> Result<()> {
    let mut bytes = Vec::with_capacity(line.len() + LINE_TERMINATOR.len());
    bytes.extend_from_slice(line.as_bytes());
    bytes.extend_from_slice(LINE_TERMINATOR);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read one terminated response
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    let mut buf = Vec::new();
    reader.read_until(RESPONSE_TERMINATOR, &mut buf)?;

    if buf.last() != Some(&RESPONSE_TERMINATOR) {
        return Err(LodeError::Network(
            "connection closed before a response arrived".to_string(),
        ));
    }
    Ok(decode_response(&buf))
}

/// Encode and write a response
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
