//! Journal Recovery
//!
//! Reads back a journal after a restart or crash.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{LodeError, Result};
use super::{JournalReader, LogEntry};

/// Handles journal recovery
pub struct JournalRecovery;

/// Result of a recovery or verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully read
    pub entries_recovered: u64,

    /// Number of complete but corrupted entries skipped
    pub entries_corrupted: u64,

    /// Highest valid LSN (0 if none)
    pub last_lsn: u64,

    /// Whether the journal ended in a partial record. `recover` and `repair`
    /// cut it off; `verify` only reports it.
    pub was_truncated: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Collect entries and cut off a torn tail
    Recover,

    /// Cut off a torn tail without collecting entries
    Repair,

    /// Read only
    Verify,
}

impl JournalRecovery {
    /// Recover entries from a journal file
    ///
    /// This will:
    /// 1. Read all valid entries in append order
    /// 2. Skip entries whose checksum or body is bad
    /// 3. Truncate a partial record at the end
    pub fn recover(path: &Path) -> Result<(Vec<LogEntry>, RecoveryResult)> {
        scan(path, Mode::Recover)
    }

    /// Cut off a torn tail and report stats, without keeping the entries
    pub fn repair(path: &Path) -> Result<RecoveryResult> {
        scan(path, Mode::Repair).map(|(_, result)| result)
    }

    /// Check the integrity of a journal file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        scan(path, Mode::Verify).map(|(_, result)| result)
    }
}

fn scan(path: &Path, mode: Mode) -> Result<(Vec<LogEntry>, RecoveryResult)> {
    let mut reader = JournalReader::open(path)?;
    let mut entries = Vec::new();
    let mut result = RecoveryResult::default();
    let mut cut_at = None;

    loop {
        match reader.next_entry() {
            Ok(Some(entry)) => {
                result.entries_recovered += 1;
                result.last_lsn = result.last_lsn.max(entry.lsn);
                if mode == Mode::Recover {
                    entries.push(entry);
                }
            }
            Ok(None) => break,
            Err(err @ (LodeError::ChecksumMismatch { .. } | LodeError::Serialization(_))) => {
                tracing::warn!("Skipping corrupted entry in {}: {}", path.display(), err);
                result.entries_corrupted += 1;
            }
            Err(err @ (LodeError::TornWrite { .. } | LodeError::LogCorruption(_))) => {
                tracing::warn!("Journal {} ends badly: {}", path.display(), err);
                cut_at = Some(reader.position());
                break;
            }
            Err(err) => return Err(err),
        }
    }

    if let Some(offset) = cut_at {
        result.was_truncated = true;
        if mode != Mode::Verify {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(offset)?;
            file.sync_all()?;
            tracing::info!("Truncated {} to {} bytes", path.display(), offset);
        }
    }

    Ok((entries, result))
}
