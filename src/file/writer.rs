//! Size-bounded rotating file writer
//!
//! The writer always appends to a timestamped file next to the configured base
//! path, and keeps a symlink at the base path pointing to it (unless process
//! ids are embedded in file names, in which case every process's files are
//! self-identifying and no symlink is kept). Once a write pushes the byte count
//! past `max_size`, the writer opens a fresh timestamped file and queues the
//! cleanup of the old one for the housekeeping worker.
//!
//! The write path emits no tracing events: this writer is commonly the sink of
//! the tracing subscriber itself.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::config::{FileWriterConfig, DEFAULT_DIR_MODE};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::file::clock::{Clock, SystemClock};
use crate::file::housekeeping::{self, Job};
use crate::file::naming;
use crate::host::HostIdentity;
use crate::metrics::MetricsCollector;
use crate::writer::EntryWriter;

/// Mutable state guarded by the writer's lock
#[derive(Debug, Default)]
struct FileState {
    /// Current output handle; `None` while closed
    file: Option<File>,
    /// Path of the current output handle
    path: Option<PathBuf>,
    /// Bytes written to `file` since it was opened
    size: u64,
}

/// A writer that rotates its output file once it grows past a size limit
#[derive(Debug)]
pub struct FileWriter {
    config: FileWriterConfig,
    identity: &'static HostIdentity,
    clock: Arc<dyn Clock>,
    state: Mutex<FileState>,
    metrics: Arc<MetricsCollector>,
}

impl FileWriter {
    /// Create a writer from a validated configuration.
    ///
    /// No file is opened until the first write.
    pub fn new(config: FileWriterConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            identity: HostIdentity::global(),
            clock: Arc::new(SystemClock),
            state: Mutex::new(FileState::default()),
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Create a writer for `path` with default settings
    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(FileWriterConfig::new().with_path(path))
    }

    /// Use a different host identity for file names
    pub fn with_host_identity(mut self, identity: &'static HostIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Use a different time source for rotation timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Write `buf` to the current file, rotating afterwards if the size limit
    /// was exceeded.
    ///
    /// A single write is never split: it may carry the file past the limit,
    /// and the rotation happens once it has landed. If that rotation fails the
    /// bytes are already in the old file and the rotation error is returned;
    /// the next write goes to the old file and retries the rotation.
    ///
    /// File names have a resolution of one second. A rotation that would reuse
    /// the current name is skipped, so under a high write rate a file can grow
    /// past the limit until the clock moves on.
    ///
    /// Without a configured path the bytes go to standard error.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();

        let base = match self.config.path {
            Some(ref base) => base,
            None => {
                io::stderr().write_all(buf)?;
                self.metrics.increment_stderr_writes();
                return Ok(buf.len());
            }
        };

        if state.file.is_none() {
            self.create(&mut state, base)?;
        }

        let written = match state.file.as_mut() {
            Some(file) => file.write_all(buf).map(|()| buf.len()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "log file is not open")),
        };
        let n = match written {
            Ok(n) => n,
            Err(e) => {
                self.metrics.increment_write_errors();
                let path = state.path.clone().unwrap_or_else(|| base.clone());
                return Err(Error::write(path, e));
            }
        };

        state.size += n as u64;
        self.metrics.record_write(n);

        if self.config.max_size > 0 && state.size > self.config.max_size {
            self.rotate_locked(&mut state, base)?;
        }

        Ok(n)
    }

    /// Write an entry's payload; destination tags are ignored
    pub fn write_entry(&self, entry: &Entry) -> Result<usize> {
        self.write(entry.as_bytes())
    }

    /// Close the current file. The next write opens a new one.
    ///
    /// Closing a closed writer succeeds.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(file) = state.file.take() {
            drop(file);
            state.size = 0;
            state.path = None;
        }
        Ok(())
    }

    /// Rotate now, regardless of the current size.
    ///
    /// Meant for rotations driven from outside, such as a timer or `SIGHUP`.
    /// Without a configured path there is nothing to rotate, and within the
    /// second the current file was named in, rotating is a no-op.
    pub fn rotate(&self) -> Result<()> {
        let mut state = self.state.lock();
        match self.config.path {
            Some(ref base) => self.rotate_locked(&mut state, base),
            None => Ok(()),
        }
    }

    /// Bytes written to the current file since it was opened
    pub fn size(&self) -> u64 {
        self.state.lock().size
    }

    /// Whether a file is currently open
    pub fn is_open(&self) -> bool {
        self.state.lock().file.is_some()
    }

    /// Path of the current file, if one is open
    pub fn current_path(&self) -> Option<PathBuf> {
        self.state.lock().path.clone()
    }

    pub fn config(&self) -> &FileWriterConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn host_identity(&self) -> &'static HostIdentity {
        self.identity
    }

    /// Open the first file after construction or `close`
    fn create(&self, state: &mut FileState, base: &Path) -> Result<()> {
        if self.config.ensure_dir {
            ensure_parent_dir(base)?;
        }

        let path = self.next_path(base);
        let file = self.open_file(&path).map_err(|e| Error::open(&path, e))?;

        state.file = Some(file);
        state.path = Some(path.clone());
        state.size = 0;
        self.metrics.increment_file_opens();

        // The symlink goes through the queue so that jobs of earlier rotations
        // cannot re-point it at an older file. Pruning is left to rotations.
        housekeeping::submit(Job {
            old_file: None,
            new_path: path,
            base_path: base.to_path_buf(),
            max_backups: 0,
            link: self.config.maintains_symlink(),
            metrics: self.metrics.clone(),
        });

        Ok(())
    }

    /// Swap in a freshly opened file; called with the state lock held.
    ///
    /// A name equal to the current file's (a second rotation within the same
    /// clock second) leaves the handle and the byte count alone.
    fn rotate_locked(&self, state: &mut FileState, base: &Path) -> Result<()> {
        let started = Instant::now();
        let path = self.next_path(base);
        if state.file.is_some() && state.path.as_ref() == Some(&path) {
            return Ok(());
        }

        let file = match self.open_file(&path) {
            Ok(file) => file,
            Err(e) => {
                self.metrics.increment_rotation_failures();
                return Err(Error::rotation(path, e));
            }
        };

        let old_file = state.file.replace(file);
        state.path = Some(path.clone());
        state.size = 0;
        self.metrics.record_rotation(started.elapsed());

        housekeeping::submit(Job {
            old_file,
            new_path: path,
            base_path: base.to_path_buf(),
            max_backups: self.config.max_backups,
            link: self.config.maintains_symlink(),
            metrics: self.metrics.clone(),
        });

        Ok(())
    }

    fn next_path(&self, base: &Path) -> PathBuf {
        let timestamp = naming::format_timestamp(self.clock.now(), self.config.local_time);
        let tag = naming::identity_tag(self.identity, self.config.host_name, self.config.process_id);
        naming::backup_path(base, &timestamp, tag.as_deref())
    }

    fn open_file(&self, path: &Path) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.append(true).create(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.config.effective_file_mode());
        }

        options.open(path)
    }
}

fn ensure_parent_dir(base: &Path) -> Result<()> {
    let parent = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DEFAULT_DIR_MODE);
    }
    #[cfg(not(unix))]
    let _ = DEFAULT_DIR_MODE;

    builder.create(parent).map_err(|e| Error::directory(parent, e))
}

impl EntryWriter for FileWriter {
    fn write_entry(&self, entry: &Entry) -> Result<usize> {
        FileWriter::write_entry(self, entry)
    }

    fn close(&self) -> Result<()> {
        FileWriter::close(self)
    }
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        FileWriter::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for &FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        FileWriter::write(*self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
