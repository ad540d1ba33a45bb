//! Configuration for LodeKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LodeError, Result};
use crate::protocol::DEFAULT_READ_BUFFER_SIZE;

/// Main configuration for a LodeKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all journal files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── storage_0.log    (journal of database 0)
    ///     └── storage_N.log    (one per journaled database)
    pub data_dir: PathBuf,

    /// Whether databases journal their mutations
    pub journal_enabled: bool,

    /// Replay database 0's journal when the storage core opens
    pub recover_on_startup: bool,

    // -------------------------------------------------------------------------
    // Journal Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the journal
    pub log_sync_strategy: LogSyncStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Size of one socket read, and the longest accepted command line
    pub read_buffer_size: usize,

    /// Capacity of the dispatcher's inbound queue
    pub inbound_queue_capacity: usize,

    /// How often blocked reads and the accept loop check for shutdown (milliseconds)
    pub poll_interval_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,
}

/// Journal sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./lodekv_data"),
            journal_enabled: true,
            recover_on_startup: true,
            log_sync_strategy: LogSyncStrategy::EveryNEntries { count: 100 },
            listen_addr: "127.0.0.1:8001".to_string(),
            max_connections: 1024,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            inbound_queue_capacity: 1024,
            poll_interval_ms: 100,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_size == 0 {
            return Err(LodeError::Config("read_buffer_size must be > 0".to_string()));
        }
        if self.inbound_queue_capacity == 0 {
            return Err(LodeError::Config(
                "inbound_queue_capacity must be > 0".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(LodeError::Config("max_connections must be > 0".to_string()));
        }
        if let LogSyncStrategy::EveryNEntries { count: 0 } = self.log_sync_strategy {
            return Err(LodeError::Config(
                "EveryNEntries sync count must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Write timeout, `None` when disabled
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all journals)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Enable or disable journaling
    pub fn journal_enabled(mut self, enabled: bool) -> Self {
        self.config.journal_enabled = enabled;
        self
    }

    /// Enable or disable replay of database 0 at startup
    pub fn recover_on_startup(mut self, enabled: bool) -> Self {
        self.config.recover_on_startup = enabled;
        self
    }

    /// Set the journal sync strategy
    pub fn log_sync_strategy(mut self, strategy: LogSyncStrategy) -> Self {
        self.config.log_sync_strategy = strategy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the per-connection read buffer size (in bytes)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set the dispatcher queue capacity
    pub fn inbound_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.inbound_queue_capacity = capacity;
        self
    }

    /// Set the shutdown poll interval (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
