//! Storage Manager
//!
//! Owns every database and creates them on first reference.
//!
//! ## Responsibilities
//! - Open database 0 at startup (journaled unless configured otherwise)
//! - Look up or lazily create databases by id
//! - Replay existing journals when a database is opened, if configured

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{Config, LogSyncStrategy};
use crate::error::Result;

use super::{Database, DbId, ReplayReport};

/// Id of the database that always exists and that clients talk to
pub const DEFAULT_DATABASE: DbId = 0;

/// Collection of databases indexed by id
///
/// ## Concurrency:
/// - `databases`: RwLock; lookups take the read lock, creation takes the
///   write lock and re-checks, so two callers never create the same id
pub struct StorageCore {
    data_dir: PathBuf,
    journal_enabled: bool,
    recover_on_open: bool,
    sync_strategy: LogSyncStrategy,
    databases: RwLock<HashMap<DbId, Arc<Database>>>,
}

impl StorageCore {
    /// Open the storage core described by `config`
    ///
    /// On startup:
    /// 1. Create the data directory if needed
    /// 2. Open database 0
    /// 3. Replay its journal if one exists and `recover_on_startup` is set
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let core = Self {
            data_dir: config.data_dir.clone(),
            journal_enabled: config.journal_enabled,
            recover_on_open: config.recover_on_startup,
            sync_strategy: config.log_sync_strategy,
            databases: RwLock::new(HashMap::new()),
        };
        core.database(DEFAULT_DATABASE)?;

        Ok(core)
    }

    /// Get the database with `id`, creating it on first reference
    pub fn database(&self, id: DbId) -> Result<Arc<Database>> {
        if let Some(db) = self.get(id) {
            return Ok(db);
        }

        let mut databases = self.databases.write();
        if let Some(db) = databases.get(&id) {
            return Ok(Arc::clone(db));
        }

        let db = Arc::new(self.open_database(id)?);
        databases.insert(id, Arc::clone(&db));
        Ok(db)
    }

    /// The database clients are served from
    pub fn default_database(&self) -> Result<Arc<Database>> {
        self.database(DEFAULT_DATABASE)
    }

    /// Get an existing database without creating it
    pub fn get(&self, id: DbId) -> Option<Arc<Database>> {
        self.databases.read().get(&id).cloned()
    }

    /// Ids of all open databases, ascending
    pub fn database_ids(&self) -> Vec<DbId> {
        let mut ids: Vec<DbId> = self.databases.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Replay the journal of database `id` into a fresh state
    pub fn recover(&self, id: DbId) -> Result<ReplayReport> {
        self.database(id)?.recover()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn open_database(&self, id: DbId) -> Result<Database> {
        let db = Database::open(id, &self.data_dir, self.journal_enabled, self.sync_strategy)?;

        let has_journal = db.log_path().map_or(false, Path::exists);
        if self.recover_on_open && has_journal {
            let report = db.recover()?;
            tracing::info!(
                "Database {} replayed {} entries from {}",
                id,
                report.entries_applied,
                Database::log_file_name(id)
            );
        } else {
            tracing::debug!("Database {} opened (journaled: {})", id, db.is_journaled());
        }

        Ok(db)
    }
}
