//! The write contract shared by all sinks
//!
//! Anything that can accept an [`Entry`] implements [`EntryWriter`]. Closing is
//! optional: the default `close` succeeds without doing anything.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::entry::Entry;
use crate::error::Result;

/// A sink for log entries
pub trait EntryWriter: Send + Sync {
    /// Write one entry, returning the number of payload bytes written
    fn write_entry(&self, entry: &Entry) -> Result<usize>;

    /// Release any resources held by the writer
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

impl<W: EntryWriter + ?Sized> EntryWriter for Arc<W> {
    fn write_entry(&self, entry: &Entry) -> Result<usize> {
        (**self).write_entry(entry)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

impl<W: EntryWriter + ?Sized> EntryWriter for Box<W> {
    fn write_entry(&self, entry: &Entry) -> Result<usize> {
        (**self).write_entry(entry)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

/// Adapts any `io::Write` sink to [`EntryWriter`]
///
/// Each entry is written with a single `write_all` under a lock, so entries
/// from concurrent callers never interleave.
#[derive(Debug)]
pub struct IoWriter<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Consume the adapter and return the wrapped sink
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl IoWriter<io::Stderr> {
    /// A writer that forwards entries to standard error
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> EntryWriter for IoWriter<W> {
    fn write_entry(&self, entry: &Entry) -> Result<usize> {
        let mut inner = self.inner.lock();
        inner.write_all(entry.as_bytes())?;
        Ok(entry.len())
    }

    fn close(&self) -> Result<()> {
        self.inner.lock().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_writer_collects_payloads() {
        let writer = IoWriter::new(Vec::new());

        assert_eq!(writer.write_entry(&Entry::from("one\n")).unwrap(), 4);
        assert_eq!(writer.write_entry(&Entry::from("two\n").with_destination("x")).unwrap(), 4);
        writer.close().unwrap();

        assert_eq!(writer.into_inner(), b"one\ntwo\n");
    }

    #[test]
    fn test_shared_writer_delegates() {
        let writer = Arc::new(IoWriter::new(Vec::new()));
        let dynamic: Arc<dyn EntryWriter> = writer.clone();

        dynamic.write_entry(&Entry::from("abc")).unwrap();
        dynamic.close().unwrap();

        assert_eq!(writer.inner.lock().as_slice(), b"abc");
    }
}
