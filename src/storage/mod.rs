//! Storage Module
//!
//! In-memory databases backed by per-database journals.
//!
//! ## Layout
//! ```text
//! StorageCore ── RwLock<HashMap<DbId, Arc<Database>>>
//!    │
//!    └── Database ── RwLock<{ map, list, journal }>
//!          ├── HashMap<String, StoredValue>
//!          ├── ValueList
//!          └── Option<JournalWriter>   (storage_<id>.log)
//! ```

mod manager;
mod database;
mod list;
mod value;

pub use manager::{StorageCore, DEFAULT_DATABASE};
pub use database::{Database, ReplayReport};
pub use list::{ValueList, LIST_SEPARATOR};
pub use value::StoredValue;

/// Database identifier
pub type DbId = u32;
