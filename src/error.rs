//! Error types for LodeKV
//!
//! Provides a unified error type for all operations. The `Display` text of
//! each variant is what a client sees when a command fails, so the wording of
//! the parse and storage variants is part of the wire contract.

use thiserror::Error;

use crate::storage::DbId;

/// Result type alias using LodeError
pub type Result<T> = std::result::Result<T, LodeError>;

/// Unified error type for LodeKV operations
#[derive(Debug, Error)]
pub enum LodeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Journal Errors
    // -------------------------------------------------------------------------
    #[error("journal corruption detected: {0}")]
    LogCorruption(String),

    #[error("journal checksum mismatch at lsn {lsn}")]
    ChecksumMismatch { lsn: u64 },

    #[error("journal ends with a partial record at offset {offset}")]
    TornWrite { offset: u64 },

    #[error("journal write failed: {0}")]
    LogWrite(String),

    #[error("no journal for database {0}")]
    NoJournal(DbId),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("there is no item with key of {0}")]
    KeyNotFound(String),

    #[error("list is empty")]
    ListEmpty,

    #[error("value not found in the list")]
    ListValueNotFound,

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("empty command")]
    EmptyCommand,

    #[error("invalid command: {0}")]
    UnknownCommand(String),

    #[error("{command} command needs {needs}")]
    WrongArity {
        command: &'static str,
        needs: &'static str,
    },

    #[error("must enter a key")]
    MissingKey,

    #[error("must enter a value")]
    MissingValue,

    #[error("command exceeds {limit} bytes")]
    CommandTooLong { limit: usize },

    #[error("argument {0:?} must be a single word without whitespace")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("channel closed: {0}")]
    ChannelClosed(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for LodeError {
    fn from(err: bincode::Error) -> Self {
        LodeError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for LodeError {
    fn from(err: serde_json::Error) -> Self {
        LodeError::Serialization(err.to_string())
    }
}

impl<T> From<crossbeam::channel::SendError<T>> for LodeError {
    fn from(err: crossbeam::channel::SendError<T>) -> Self {
        LodeError::ChannelClosed(err.to_string())
    }
}

impl LodeError {
    /// Whether this error came from the client's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LodeError::EmptyCommand
                | LodeError::UnknownCommand(_)
                | LodeError::WrongArity { .. }
                | LodeError::MissingKey
                | LodeError::MissingValue
                | LodeError::CommandTooLong { .. }
                | LodeError::InvalidArgument(_)
                | LodeError::KeyNotFound(_)
                | LodeError::ListEmpty
                | LodeError::ListValueNotFound
        )
    }
}
