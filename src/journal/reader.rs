//! Journal Reader
//!
//! Handles reading entries from a journal file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{LodeError, Result};
use super::entry::{decode_header, LogEntry, HEADER_SIZE, MAX_RECORD_SIZE};

/// Reads entries from a journal file, front to back
pub struct JournalReader {
    reader: BufReader<File>,

    /// Offset just past the last complete record consumed
    position: u64,
}

impl JournalReader {
    /// Open a journal file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Offset of the first byte not yet covered by a complete record
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next entry
    ///
    /// - `Ok(None)`: clean end of file
    /// - `Err(TornWrite)`: the file ends inside a record; `position()` is
    ///   where the partial record starts
    /// - `Err(ChecksumMismatch)` / `Err(Serialization)`: the record was
    ///   complete but unusable; the reader has moved past it
    /// - `Err(LogCorruption)`: the header claims an impossible length, so
    ///   framing is lost from `position()` on
    pub fn next_entry(&mut self) -> Result<Option<LogEntry>> {
        let mut header = [0u8; HEADER_SIZE];
        let read = read_up_to(&mut self.reader, &mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            return Err(LodeError::TornWrite {
                offset: self.position,
            });
        }

        let (lsn, crc, len) = decode_header(&header);
        if len > MAX_RECORD_SIZE {
            return Err(LodeError::LogCorruption(format!(
                "record at offset {} claims {} bytes",
                self.position, len
            )));
        }

        let mut body = vec![0u8; len];
        if read_up_to(&mut self.reader, &mut body)? < len {
            return Err(LodeError::TornWrite {
                offset: self.position,
            });
        }

        self.position += (HEADER_SIZE + len) as u64;
        LogEntry::decode_body(lsn, crc, &body).map(Some)
    }

    /// Iterate over entries, stopping after a framing error
    pub fn entries(self) -> JournalIterator {
        JournalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over journal entries
///
/// Yields per-record errors (checksum, decode) and keeps going; stops after
/// end of file or an error that loses framing.
pub struct JournalIterator {
    reader: JournalReader,
    done: bool,
}

impl Iterator for JournalIterator {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err @ (LodeError::ChecksumMismatch { .. } | LodeError::Serialization(_))) => {
                Some(Err(err))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Fill `buf` as far as the file allows; returns the number of bytes read
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
