//! Stored value

use bytes::Bytes;

use crate::journal::unix_millis;

/// The value bound to a key, with the time of its last write
///
/// Replaced wholesale on every write, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    data: Bytes,
    written_at: u64,
}

impl StoredValue {
    /// Wrap `data`, stamped with the current time
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_timestamp(data, unix_millis())
    }

    /// Wrap `data` with an explicit write time (used by replay)
    pub fn with_timestamp(data: impl Into<Bytes>, written_at: u64) -> Self {
        Self {
            data: data.into(),
            written_at,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Unix millis of the write that produced this value
    pub fn written_at(&self) -> u64 {
        self.written_at
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}
