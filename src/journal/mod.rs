//! Journal Module
//!
//! Per-database append-only record of mutations, replayed to rebuild state.
//!
//! ## Responsibilities
//! - Append one record per committed mutation
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Torn-tail repair and full replay on recovery
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Entry 1                                          │
//! │ ┌─────────┬─────────┬─────────┬────────────────┐ │
//! │ │ LSN (8) │ CRC (4) │ Len (4) │ bincode body   │ │
//! │ └─────────┴─────────┴─────────┴────────────────┘ │
//! ├──────────────────────────────────────────────────┤
//! │ Entry 2                                          │
//! │ ┌─────────┬─────────┬─────────┬────────────────┐ │
//! │ │ LSN (8) │ CRC (4) │ Len (4) │ bincode body   │ │
//! │ └─────────┴─────────┴─────────┴────────────────┘ │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! The body is `(action, args, timestamp)`. The CRC covers the LSN bytes and
//! the body. Records are only ever appended; a crash mid-append leaves at most
//! one partial record at the tail, which recovery cuts off.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{unix_millis, Action, LogEntry, HEADER_SIZE, MAX_RECORD_SIZE};
pub use writer::JournalWriter;
pub use reader::{JournalIterator, JournalReader};
pub use recovery::{JournalRecovery, RecoveryResult};
