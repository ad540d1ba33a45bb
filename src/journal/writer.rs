//! Journal Writer
//!
//! Handles appending entries to a journal file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::LogSyncStrategy;
use crate::error::{LodeError, Result};
use super::{Action, JournalRecovery, LogEntry};

/// Appends entries to a journal file
pub struct JournalWriter {
    file: File,
    path: PathBuf,

    /// LSN handed to the next append
    next_lsn: u64,

    /// Length of the file up to the last complete record
    len: u64,

    sync_strategy: LogSyncStrategy,

    /// Entries written since the last fsync
    unsynced: usize,
}

impl JournalWriter {
    /// Open or create a journal file
    ///
    /// An existing file is repaired first (a torn tail is cut off) and LSNs
    /// continue after its last valid entry.
    pub fn open(path: &Path, sync_strategy: LogSyncStrategy) -> Result<Self> {
        let next_lsn = if path.exists() {
            JournalRecovery::repair(path)?.last_lsn + 1
        } else {
            1
        };
        Self::open_at(path, sync_strategy, next_lsn)
    }

    /// Open without scanning, for callers that already recovered the file
    pub(crate) fn open_at(path: &Path, sync_strategy: LogSyncStrategy, next_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            file,
            path: path.to_path_buf(),
            next_lsn,
            len,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append an entry, returning its LSN
    ///
    /// On failure nothing of the record is left in the file.
    pub fn append(&mut self, action: Action, args: Vec<String>) -> Result<u64> {
        let lsn = self.next_lsn;
        let record = LogEntry::new(lsn, action, args).serialize()?;

        if let Err(err) = self.write_record(&record) {
            if let Err(cut_err) = self.file.set_len(self.len) {
                tracing::error!(
                    "Failed to cut partial record from {}: {}",
                    self.path.display(),
                    cut_err
                );
            }
            return Err(LodeError::LogWrite(format!(
                "{} entry at lsn {}: {}",
                action.name(),
                lsn,
                err
            )));
        }

        self.len += record.len() as u64;
        self.next_lsn += 1;
        Ok(lsn)
    }

    fn write_record(&mut self, record: &[u8]) -> Result<()> {
        self.file.write_all(record)?;
        self.unsynced += 1;

        match self.sync_strategy {
            LogSyncStrategy::EveryWrite => self.sync(),
            LogSyncStrategy::EveryNEntries { count } if self.unsynced >= count => self.sync(),
            LogSyncStrategy::EveryNEntries { .. } => Ok(()),
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// LSN that the next append will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Size of the journal in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        if self.unsynced > 0 {
            if let Err(err) = self.sync() {
                tracing::warn!("Failed to sync {} on close: {}", self.path.display(), err);
            }
        }
    }
}
