//! Tag-routed fan-out writer
//!
//! Routes each entry to the writers named by its destination tags. Entries
//! whose tags match no configured destination go to the `"default"`
//! destination, if there is one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::FanoutConfig;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::file::FileWriter;
use crate::writer::EntryWriter;

/// Destination used when none of an entry's tags is configured
pub const DEFAULT_DESTINATION: &str = "default";

/// A writer that dispatches entries by destination tag
///
/// The writers are shared: closing them stays the caller's business, either
/// directly or through [`FanoutWriter::close`].
#[derive(Default, Clone)]
pub struct FanoutWriter {
    writers: HashMap<String, Arc<dyn EntryWriter>>,
}

impl FanoutWriter {
    /// Create a fan-out writer with no destinations
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one rotating file writer per configured destination
    pub fn from_config(config: &FanoutConfig) -> Result<Self> {
        config.validate()?;

        let mut fanout = Self::new();
        for (name, writer_config) in &config.destinations {
            let writer = FileWriter::new(writer_config.clone())
                .map_err(|e| Error::config(format!("Destination {:?}: {}", name, e)))?;
            fanout.insert(name.clone(), Arc::new(writer));
        }
        Ok(fanout)
    }

    /// Add a destination
    pub fn with_destination(mut self, name: impl Into<String>, writer: Arc<dyn EntryWriter>) -> Self {
        self.insert(name, writer);
        self
    }

    /// Add or replace a destination, returning the writer it replaced
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        writer: Arc<dyn EntryWriter>,
    ) -> Option<Arc<dyn EntryWriter>> {
        self.writers.insert(name.into(), writer)
    }

    /// Remove a destination
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn EntryWriter>> {
        self.writers.remove(name)
    }

    /// The writer for a destination
    pub fn get(&self, name: &str) -> Option<&Arc<dyn EntryWriter>> {
        self.writers.get(name)
    }

    /// Configured destination names, in no particular order
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.writers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Dispatch an entry to every matching destination.
    ///
    /// Returns the byte count of the last dispatched write and the first error
    /// encountered; a failing destination does not stop the others.
    pub fn write_entry(&self, entry: &Entry) -> Result<usize> {
        if entry.destinations().is_empty() || self.writers.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        let mut first_error = None;
        let mut matched = false;

        let mut dispatch = |writer: &Arc<dyn EntryWriter>| match writer.write_entry(entry) {
            Ok(n) => written = n,
            Err(e) => {
                written = 0;
                first_error.get_or_insert(e);
            }
        };

        for name in entry.destinations() {
            if let Some(writer) = self.writers.get(name) {
                matched = true;
                dispatch(writer);
            }
        }

        if !matched {
            if let Some(writer) = self.writers.get(DEFAULT_DESTINATION) {
                dispatch(writer);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    /// Close every destination, returning the first error
    pub fn close(&self) -> Result<()> {
        let mut first_error = None;
        for writer in self.writers.values() {
            if let Err(e) = writer.close() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for FanoutWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.destinations().collect();
        names.sort_unstable();
        f.debug_struct("FanoutWriter").field("destinations", &names).finish()
    }
}

impl EntryWriter for FanoutWriter {
    fn write_entry(&self, entry: &Entry) -> Result<usize> {
        FanoutWriter::write_entry(self, entry)
    }

    fn close(&self) -> Result<()> {
        FanoutWriter::close(self)
    }
}
