//! # silk_rs
//!
//! File sinks for ChrysalisRS log entries.
//!
//! - [`FileWriter`] appends serialized entries to timestamped files, rotates
//!   them once they grow past a size limit and keeps a bounded number of old
//!   files around.
//! - [`FanoutWriter`] routes each entry to the writers named by its
//!   destination tags, with a `"default"` destination as fallback.
//!
//! ```no_run
//! use silk_rs::{Entry, FileWriter, FileWriterConfig};
//!
//! # fn main() -> silk_rs::Result<()> {
//! let writer = FileWriter::new(
//!     FileWriterConfig::new()
//!         .with_path("/var/log/app/app.log")
//!         .with_max_size(10 * 1024 * 1024)
//!         .with_max_backups(5),
//! )?;
//!
//! writer.write_entry(&Entry::from("service started\n"))?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod fanout;
pub mod file;
pub mod host;
pub mod metrics;
pub mod writer;

pub use config::{FanoutConfig, FileWriterConfig};
pub use entry::Entry;
pub use error::{Error, Result};
pub use fanout::{FanoutWriter, DEFAULT_DESTINATION};
pub use file::FileWriter;
pub use host::HostIdentity;
pub use metrics::MetricsCollector;
pub use writer::{EntryWriter, IoWriter};
