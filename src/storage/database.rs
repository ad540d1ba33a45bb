//! Database
//!
//! One isolated key/value map plus its secondary list.
//!
//! ## Concurrency
//! A single `RwLock` guards the map, the list and the journal writer. Every
//! mutation and its journal append happen under the same write guard: the
//! in-memory change is applied first, then journaled, and undone if the
//! append fails. Memory and journal therefore never disagree, and journal
//! order equals apply order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::config::LogSyncStrategy;
use crate::error::{LodeError, Result};
use crate::journal::{Action, JournalRecovery, JournalWriter, LogEntry, RecoveryResult};

use super::{DbId, StoredValue, ValueList};

/// A single database
pub struct Database {
    id: DbId,

    /// Where this database's journal lives; `None` for purely in-memory databases
    log_path: Option<PathBuf>,

    sync_strategy: LogSyncStrategy,

    inner: RwLock<Inner>,
}

struct Inner {
    contents: Contents,

    /// Present when journaling is enabled
    journal: Option<JournalWriter>,
}

/// Map and list; the part of a database that replay rebuilds
#[derive(Default)]
struct Contents {
    entries: HashMap<String, StoredValue>,
    list: ValueList,
}

/// Outcome of `Database::recover`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// What reading the journal found
    pub journal: RecoveryResult,

    /// Entries applied to the fresh state
    pub entries_applied: u64,

    /// Deletes whose target was already gone
    pub entries_skipped: u64,
}

impl Database {
    /// Journal file name for a database id
    pub fn log_file_name(id: DbId) -> String {
        format!("storage_{}.log", id)
    }

    /// Create an in-memory database with no journal
    pub fn new(id: DbId) -> Self {
        Self {
            id,
            log_path: None,
            sync_strategy: LogSyncStrategy::EveryWrite,
            inner: RwLock::new(Inner {
                contents: Contents::default(),
                journal: None,
            }),
        }
    }

    /// Open a database whose journal lives in `data_dir`
    ///
    /// With `journaled` false, mutations are not recorded, but an existing
    /// journal can still be replayed with [`Database::recover`].
    pub fn open(
        id: DbId,
        data_dir: &Path,
        journaled: bool,
        sync_strategy: LogSyncStrategy,
    ) -> Result<Self> {
        let log_path = data_dir.join(Self::log_file_name(id));
        let journal = if journaled {
            Some(JournalWriter::open(&log_path, sync_strategy)?)
        } else {
            None
        };

        Ok(Self {
            id,
            log_path: Some(log_path),
            sync_strategy,
            inner: RwLock::new(Inner {
                contents: Contents::default(),
                journal,
            }),
        })
    }

    // =========================================================================
    // Map Operations
    // =========================================================================

    /// Insert or overwrite `key`
    pub fn set(&self, key: &str, value: impl Into<Bytes>) -> Result<()> {
        let value = value.into();
        let mut inner = self.inner.write();
        if inner.journal.is_some() {
            ensure_utf8(&value)?;
        }

        let previous = inner
            .contents
            .entries
            .insert(key.to_owned(), StoredValue::new(value.clone()));

        inner.record(
            Action::Set,
            || vec![key.to_owned(), lossy(&value)],
            |contents| match previous {
                Some(previous) => {
                    contents.entries.insert(key.to_owned(), previous);
                }
                None => {
                    contents.entries.remove(key);
                }
            },
        )
    }

    /// Value currently bound to `key`
    pub fn get(&self, key: &str) -> Result<StoredValue> {
        self.inner
            .read()
            .contents
            .entries
            .get(key)
            .cloned()
            .ok_or_else(|| LodeError::KeyNotFound(key.to_owned()))
    }

    /// Remove `key`
    pub fn del(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let removed = inner
            .contents
            .entries
            .remove(key)
            .ok_or_else(|| LodeError::KeyNotFound(key.to_owned()))?;

        inner.record(
            Action::Del,
            || vec![key.to_owned()],
            |contents| {
                contents.entries.insert(key.to_owned(), removed);
            },
        )
    }

    /// All live keys, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().contents.entries.keys().cloned().collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().contents.entries.contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.inner.read().contents.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // List Operations
    // =========================================================================

    /// Append `value` to the tail of the list
    pub fn list_insert(&self, value: impl Into<Bytes>) -> Result<()> {
        let value = value.into();
        let mut inner = self.inner.write();
        if inner.journal.is_some() {
            ensure_utf8(&value)?;
        }

        inner.contents.list.push(value.clone());
        inner.record(
            Action::ListInsert,
            || vec![lossy(&value)],
            |contents| {
                contents.list.pop();
            },
        )
    }

    /// First list element equal to `value`
    pub fn list_get(&self, value: &[u8]) -> Result<Bytes> {
        self.inner.read().contents.list.find(value).cloned()
    }

    /// Remove the first list element equal to `value`
    pub fn list_delete(&self, value: &[u8]) -> Result<()> {
        let mut inner = self.inner.write();
        let (index, removed) = inner.contents.list.remove(value)?;

        inner.record(
            Action::ListDelete,
            || vec![lossy(value)],
            |contents| contents.list.insert(index, removed),
        )
    }

    /// The list rendered as its elements joined by `", "`
    pub fn list_show(&self) -> Result<Bytes> {
        self.inner.read().contents.list.render()
    }

    pub fn list_len(&self) -> usize {
        self.inner.read().contents.list.len()
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Replace the current state with the result of replaying the journal
    ///
    /// The journal is read in append order and every entry is applied to an
    /// empty state, so nothing is applied twice. If any entry is malformed
    /// the current state is left untouched. If the journal cannot be read or
    /// reopened, the error is returned and the existing writer keeps
    /// journaling.
    pub fn recover(&self) -> Result<ReplayReport> {
        let path = match self.log_path.as_deref() {
            Some(path) if path.exists() => path,
            _ => return Err(LodeError::NoJournal(self.id)),
        };

        let mut inner = self.inner.write();

        // Recovery only cuts bytes past the writer's last complete record, so
        // the current writer stays usable until its replacement is open
        let (entries, journal) = JournalRecovery::recover(path)?;

        if let Some(writer) = inner.journal.as_mut() {
            let next_lsn = writer.current_lsn().max(journal.last_lsn + 1);
            *writer = JournalWriter::open_at(path, self.sync_strategy, next_lsn)?;
        }

        let (contents, entries_applied, entries_skipped) = Contents::replay(self.id, &entries)?;
        inner.contents = contents;

        tracing::info!(
            "Database {} recovered: {} applied, {} skipped, {} corrupted",
            self.id,
            entries_applied,
            entries_skipped,
            journal.entries_corrupted
        );

        Ok(ReplayReport {
            journal,
            entries_applied,
            entries_skipped,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> DbId {
        self.id
    }

    /// Whether mutations are currently journaled
    pub fn is_journaled(&self) -> bool {
        self.inner.read().journal.is_some()
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Force the journal to disk
    pub fn sync(&self) -> Result<()> {
        match self.inner.write().journal.as_mut() {
            Some(journal) => journal.sync(),
            None => Ok(()),
        }
    }
}

impl Inner {
    /// Journal a mutation that has already been applied to `contents`
    ///
    /// `undo` reverts that mutation when the append fails.
    fn record(
        &mut self,
        action: Action,
        args: impl FnOnce() -> Vec<String>,
        undo: impl FnOnce(&mut Contents),
    ) -> Result<()> {
        let Some(journal) = self.journal.as_mut() else {
            return Ok(());
        };

        if let Err(err) = journal.append(action, args()) {
            tracing::warn!("Rolling back {} after journal failure: {}", action.name(), err);
            undo(&mut self.contents);
            return Err(err);
        }
        Ok(())
    }
}

impl Contents {
    /// Build a fresh state from journal entries, in order
    ///
    /// Returns the state and the applied/skipped counts.
    fn replay(id: DbId, entries: &[LogEntry]) -> Result<(Self, u64, u64)> {
        let mut contents = Self::default();
        let mut applied = 0;
        let mut skipped = 0;

        for entry in entries {
            let hit = match (entry.action, entry.args.as_slice()) {
                (Action::Set, [key, value]) => {
                    let value = StoredValue::with_timestamp(value.clone(), entry.timestamp);
                    contents.entries.insert(key.clone(), value);
                    true
                }
                (Action::Del, [key]) => contents.entries.remove(key).is_some(),
                (Action::ListInsert, [value]) => {
                    contents.list.push(value.clone());
                    true
                }
                (Action::ListDelete, [value]) => contents.list.remove(value.as_bytes()).is_ok(),
                (action, args) => {
                    return Err(LodeError::LogCorruption(format!(
                        "database {}: {} entry at lsn {} has {} arguments, expected {}",
                        id,
                        action.name(),
                        entry.lsn,
                        args.len(),
                        action.arity()
                    )));
                }
            };

            if hit {
                applied += 1;
            } else {
                tracing::warn!(
                    "Database {}: {} at lsn {} found nothing to remove",
                    id,
                    entry.action.name(),
                    entry.lsn
                );
                skipped += 1;
            }
        }

        Ok((contents, applied, skipped))
    }
}

fn ensure_utf8(value: &[u8]) -> Result<()> {
    std::str::from_utf8(value)
        .map(|_| ())
        .map_err(|_| LodeError::Serialization("journaled values must be valid UTF-8".to_string()))
}

fn lossy(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}
