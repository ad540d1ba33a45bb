//! Journal entry definitions
//!
//! Defines the structure of individual journal records and their encoding.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::{LodeError, Result};

/// Header size: LSN (8) + CRC (4) + body length (4)
pub const HEADER_SIZE: usize = 16;

/// Largest body a record may claim; anything bigger is treated as corruption
pub const MAX_RECORD_SIZE: usize = 64 * 1024 * 1024;

/// Mutations that are journaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// `SET key value`
    Set,

    /// `DEL key`
    Del,

    /// `RSET value`
    ListInsert,

    /// `RDEL value`
    ListDelete,
}

impl Action {
    /// Wire name of the command that produced this action
    pub fn name(&self) -> &'static str {
        match self {
            Action::Set => "SET",
            Action::Del => "DEL",
            Action::ListInsert => "RSET",
            Action::ListDelete => "RDEL",
        }
    }

    /// Number of arguments a well-formed entry carries
    pub fn arity(&self) -> usize {
        match self {
            Action::Set => 2,
            Action::Del | Action::ListInsert | Action::ListDelete => 1,
        }
    }
}

/// A single entry in the journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Log Sequence Number - monotonically increasing per journal
    pub lsn: u64,

    /// The mutation that was applied
    pub action: Action,

    /// Arguments in command order
    pub args: Vec<String>,

    /// Timestamp (unix millis) when the entry was created
    pub timestamp: u64,
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, action: Action, args: Vec<String>) -> Self {
        Self {
            lsn,
            action,
            args,
            timestamp: unix_millis(),
        }
    }

    /// Encode the entry as a full record (header + body)
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(&(self.action, &self.args, self.timestamp))?;
        if body.len() > MAX_RECORD_SIZE {
            return Err(LodeError::LogWrite(format!(
                "record body of {} bytes exceeds limit of {}",
                body.len(),
                MAX_RECORD_SIZE
            )));
        }

        let mut record = Vec::with_capacity(HEADER_SIZE + body.len());
        record.put_u64_le(self.lsn);
        record.put_u32_le(checksum(self.lsn, &body));
        record.put_u32_le(body.len() as u32);
        record.put_slice(&body);
        Ok(record)
    }

    /// Decode a full record produced by [`LogEntry::serialize`]
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(LodeError::LogCorruption(format!(
                "incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let (lsn, crc, len) = decode_header(&bytes[..HEADER_SIZE]);
        let body = &bytes[HEADER_SIZE..];
        if body.len() != len {
            return Err(LodeError::LogCorruption(format!(
                "body length mismatch: header says {}, got {}",
                len,
                body.len()
            )));
        }

        Self::decode_body(lsn, crc, body)
    }

    /// Verify and decode a body whose header has already been parsed
    pub(crate) fn decode_body(lsn: u64, crc: u32, body: &[u8]) -> Result<Self> {
        if checksum(lsn, body) != crc {
            return Err(LodeError::ChecksumMismatch { lsn });
        }

        let (action, args, timestamp): (Action, Vec<String>, u64) = bincode::deserialize(body)?;
        Ok(Self {
            lsn,
            action,
            args,
            timestamp,
        })
    }
}

/// Split a header into (lsn, crc, body length)
pub(crate) fn decode_header(mut header: &[u8]) -> (u64, u32, usize) {
    let lsn = header.get_u64_le();
    let crc = header.get_u32_le();
    let len = header.get_u32_le() as usize;
    (lsn, crc, len)
}

fn checksum(lsn: u64, body: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&lsn.to_le_bytes());
    hasher.update(body);
    hasher.finalize()
}

/// Milliseconds since the unix epoch (0 if the clock is before it)
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
