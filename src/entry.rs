//! Log entries as seen by writers
//!
//! An entry is an already-encoded byte payload plus the logical destinations
//! the producer attached to it. Writers never look inside the payload.

use serde::Serialize;

use crate::error::Result;

/// An encoded log entry and its destination tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    buf: Vec<u8>,
    destinations: Vec<String>,
}

impl Entry {
    /// Create an untagged entry from an encoded payload
    pub fn new(buf: impl Into<Vec<u8>>) -> Self {
        Self {
            buf: buf.into(),
            destinations: Vec::new(),
        }
    }

    /// Encode a value as a single JSON line
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        let mut buf = serde_json::to_vec(value)?;
        buf.push(b'\n');
        Ok(Self::new(buf))
    }

    /// Tag the entry with a destination
    pub fn with_destination(mut self, name: impl Into<String>) -> Self {
        self.add_destination(name);
        self
    }

    /// Tag the entry with a destination; duplicate tags are ignored
    pub fn add_destination(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.destinations.contains(&name) {
            self.destinations.push(name);
        }
    }

    /// Destination tags in the order they were added
    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }

    /// The encoded payload
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take the payload, dropping the tags
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl From<Vec<u8>> for Entry {
    fn from(buf: Vec<u8>) -> Self {
        Self::new(buf)
    }
}

impl From<&str> for Entry {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<String> for Entry {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}
