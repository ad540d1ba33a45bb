//! Secondary value list
//!
//! An ordered collection of raw values kept next to each database's map.
//! Appends are O(1); lookups and removals scan from the head.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{LodeError, Result};

/// Separator used when rendering the list
pub const LIST_SEPARATOR: &[u8] = b", ";

/// Ordered list of values, oldest first
#[derive(Debug, Clone, Default)]
pub struct ValueList {
    values: Vec<Bytes>,
}

impl ValueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value at the tail
    pub fn push(&mut self, value: impl Into<Bytes>) {
        self.values.push(value.into());
    }

    /// Remove the tail value
    pub fn pop(&mut self) -> Option<Bytes> {
        self.values.pop()
    }

    /// Put a value back at `index` (clamped to the tail)
    pub fn insert(&mut self, index: usize, value: Bytes) {
        let index = index.min(self.values.len());
        self.values.insert(index, value);
    }

    /// Find the first value equal to `value`
    pub fn find(&self, value: &[u8]) -> Result<&Bytes> {
        if self.values.is_empty() {
            return Err(LodeError::ListEmpty);
        }
        self.values
            .iter()
            .find(|v| v.as_ref() == value)
            .ok_or(LodeError::ListValueNotFound)
    }

    /// Remove the first value equal to `value`, returning where it was
    pub fn remove(&mut self, value: &[u8]) -> Result<(usize, Bytes)> {
        if self.values.is_empty() {
            return Err(LodeError::ListEmpty);
        }
        let index = self
            .values
            .iter()
            .position(|v| v.as_ref() == value)
            .ok_or(LodeError::ListValueNotFound)?;
        Ok((index, self.values.remove(index)))
    }

    /// All values joined by `", "`
    pub fn render(&self) -> Result<Bytes> {
        if self.values.is_empty() {
            return Err(LodeError::ListEmpty);
        }

        let size = self.values.iter().map(Bytes::len).sum::<usize>()
            + LIST_SEPARATOR.len() * (self.values.len() - 1);
        let mut out = BytesMut::with_capacity(size);
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.put_slice(LIST_SEPARATOR);
            }
            out.put_slice(value);
        }
        Ok(out.freeze())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
