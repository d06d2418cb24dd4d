//! Post-rotation housekeeping
//!
//! After a rotation swaps in a new file, the old handle still has to be closed,
//! the current-file symlink re-pointed, ownership restored and stale backups
//! pruned. None of that may hold up the write path, so each rotation queues a
//! [`Job`] for a single process-wide worker thread. Opening the first file
//! queues a job as well, so symlink updates happen in the order files were
//! created.
//!
//! Housekeeping is best-effort: failures are logged at debug level and counted
//! in the writer's metrics, never returned. A rotation that succeeded only
//! guarantees the new file is open, not that its housekeeping has run; use
//! [`wait_idle`] to wait for queued jobs.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{self, Sender};
use once_cell::sync::Lazy;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::file::naming;
use crate::file::ownership::OwnershipHint;
use crate::metrics::MetricsCollector;

/// Name of the housekeeping worker thread
pub const WORKER_THREAD_NAME: &str = "silk-housekeeping";

enum Message {
    Cleanup(Job),
    Barrier(Sender<()>),
}

static WORKER: Lazy<Sender<Message>> = Lazy::new(spawn_worker);

fn spawn_worker() -> Sender<Message> {
    let (tx, rx) = channel::unbounded::<Message>();

    let spawned = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            for message in rx {
                match message {
                    Message::Cleanup(job) => job.run(),
                    Message::Barrier(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });

    // Without a worker the receiver is gone and `submit` runs jobs inline.
    if let Err(e) = spawned {
        warn!(error = %e, "failed to start housekeeping thread, cleaning up inline");
    }

    tx
}

/// Cleanup owed after one rotation
#[derive(Debug)]
pub struct Job {
    /// Handle that was replaced by the rotation
    pub old_file: Option<File>,
    /// The file that is now current
    pub new_path: PathBuf,
    /// The configured base path
    pub base_path: PathBuf,
    /// Retention count (0 = retain all)
    pub max_backups: usize,
    /// Whether the base path should link to `new_path`
    pub link: bool,
    pub metrics: Arc<MetricsCollector>,
}

impl Job {
    /// Run every step, carrying on past failures
    pub fn run(self) {
        let Job {
            old_file,
            new_path,
            base_path,
            max_backups,
            link,
            metrics,
        } = self;

        drop(old_file);

        let failed = |step: &str, err: &dyn std::fmt::Display| {
            metrics.increment_housekeeping_errors();
            debug!(step, path = %base_path.display(), error = %err, "log housekeeping step failed");
        };

        if let Err(e) = relink(&base_path, &new_path, link) {
            failed("symlink", &e);
        }

        if let Some(hint) = OwnershipHint::from_env() {
            let link_path = if link { Some(base_path.as_path()) } else { None };
            if let Err(e) = hint.apply(link_path, &new_path) {
                failed("chown", &e);
            }
        }

        match prune_backups(&base_path, max_backups) {
            Ok(outcome) => {
                trace!(path = %base_path.display(), removed = outcome.removed, "pruned old log files");
                metrics.add_backups_pruned(outcome.removed);
                for (path, e) in &outcome.failures {
                    failed("prune", &format!("{}: {}", path.display(), e));
                }
            }
            Err(e) => failed("prune", &e),
        }

        metrics.increment_housekeeping_runs();
    }
}

/// Queue a job for the worker, or run it here if the worker is unavailable
pub fn submit(job: Job) {
    if let Err(channel::SendError(Message::Cleanup(job))) = WORKER.send(Message::Cleanup(job)) {
        job.run();
    }
}

/// Block until every job queued before this call has finished
pub fn wait_idle() {
    let (tx, rx) = channel::bounded(1);
    if WORKER.send(Message::Barrier(tx)).is_ok() {
        let _ = rx.recv();
    }
}

/// Remove whatever is at `base` and, if `link` is set, point a symlink there
/// at `target` by file name only.
pub fn relink(base: &Path, target: &Path, link: bool) -> io::Result<()> {
    match fs::remove_file(base) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if !link {
        return Ok(());
    }

    let name = target
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "link target has no file name"))?;
    symlink(Path::new(name), base)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Ok(())
}

/// Every timestamped file of `base`, oldest first
pub fn list_backups(base: &Path) -> Result<Vec<PathBuf>> {
    let pattern = naming::backup_pattern(base);
    let paths = glob::glob(&pattern)
        .map_err(|e| Error::config(format!("Invalid backup pattern {:?}: {}", pattern, e)))?;

    let mut backups: Vec<PathBuf> = paths.filter_map(|entry| entry.ok()).collect();
    backups.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(backups)
}

/// Result of a retention pass
#[derive(Debug, Default)]
pub struct PruneOutcome {
    /// Number of files removed
    pub removed: usize,
    /// Files that could not be removed
    pub failures: Vec<(PathBuf, io::Error)>,
}

/// Apply the retention policy to the timestamped files of `base`.
///
/// With `max_backups == 0` every file is kept. Otherwise the newest
/// `max_backups + 1` files survive: the retained backups plus the current file.
pub fn prune_backups(base: &Path, max_backups: usize) -> Result<PruneOutcome> {
    let mut outcome = PruneOutcome::default();
    if max_backups == 0 {
        return Ok(outcome);
    }

    let backups = list_backups(base)?;
    let excess = backups.len().saturating_sub(max_backups + 1);
    for path in backups.into_iter().take(excess) {
        match fs::remove_file(&path) {
            Ok(()) => outcome.removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => outcome.failures.push((path, e)),
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_list_backups_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("app.log");
        touch(&dir.path().join("app.2024-01-03T00-00-00.log"));
        touch(&dir.path().join("app.2024-01-01T00-00-00.log"));
        touch(&dir.path().join("app.2024-01-02T00-00-00.host-9.log"));
        touch(&dir.path().join("other.2024-01-01T00-00-00.log"));
        touch(&dir.path().join("app.log.bak"));

        let backups = list_backups(&base).unwrap();

        assert_eq!(
            names(&backups),
            vec![
                "app.2024-01-01T00-00-00.log",
                "app.2024-01-02T00-00-00.host-9.log",
                "app.2024-01-03T00-00-00.log",
            ]
        );
    }

    #[test]
    fn test_prune_keeps_backups_plus_current() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("app.log");
        for day in 1..=6 {
            touch(&dir.path().join(format!("app.2024-01-0{}T00-00-00.log", day)));
        }

        let outcome = prune_backups(&base, 2).unwrap();

        assert_eq!(outcome.removed, 3);
        assert!(outcome.failures.is_empty());
        assert_eq!(
            names(&list_backups(&base).unwrap()),
            vec![
                "app.2024-01-04T00-00-00.log",
                "app.2024-01-05T00-00-00.log",
                "app.2024-01-06T00-00-00.log",
            ]
        );
    }

    #[test]
    fn test_prune_zero_retains_all() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("app.log");
        for day in 1..=4 {
            touch(&dir.path().join(format!("app.2024-01-0{}T00-00-00.log", day)));
        }

        let outcome = prune_backups(&base, 0).unwrap();

        assert_eq!(outcome.removed, 0);
        assert_eq!(list_backups(&base).unwrap().len(), 4);
    }

    #[test]
    fn test_prune_with_few_files_is_noop() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("app.log");
        touch(&dir.path().join("app.2024-01-01T00-00-00.log"));

        assert_eq!(prune_backups(&base, 5).unwrap().removed, 0);
        assert_eq!(prune_backups(&dir.path().join("none.log"), 1).unwrap().removed, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_relink_replaces_existing_entry() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("app.log");
        let first = dir.path().join("app.2024-01-01T00-00-00.log");
        let second = dir.path().join("app.2024-01-02T00-00-00.log");
        touch(&first);
        File::create(&second).unwrap().write_all(b"newest").unwrap();

        relink(&base, &first, true).unwrap();
        relink(&base, &second, true).unwrap();

        assert_eq!(fs::read_link(&base).unwrap(), PathBuf::from("app.2024-01-02T00-00-00.log"));
        assert_eq!(fs::read_to_string(&base).unwrap(), "newest");

        relink(&base, &second, false).unwrap();
        assert!(fs::symlink_metadata(&base).is_err());
    }

    #[test]
    fn test_job_runs_all_steps() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("app.log");
        for day in 1..=4 {
            touch(&dir.path().join(format!("app.2024-01-0{}T00-00-00.log", day)));
        }
        let newest = dir.path().join("app.2024-01-04T00-00-00.log");
        let metrics = Arc::new(MetricsCollector::new());

        Job {
            old_file: Some(File::open(dir.path().join("app.2024-01-03T00-00-00.log")).unwrap()),
            new_path: newest.clone(),
            base_path: base.clone(),
            max_backups: 1,
            link: true,
            metrics: metrics.clone(),
        }
        .run();

        assert_eq!(metrics.get_housekeeping_runs(), 1);
        assert_eq!(metrics.get_backups_pruned(), 2);
        assert_eq!(list_backups(&base).unwrap().len(), 2);
        #[cfg(unix)]
        assert_eq!(fs::read_link(&base).unwrap(), PathBuf::from(newest.file_name().unwrap()));
    }

    #[test]
    fn test_submitted_jobs_finish_before_wait_idle_returns() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("svc.log");
        for day in 1..=5 {
            touch(&dir.path().join(format!("svc.2024-02-0{}T00-00-00.log", day)));
        }
        let metrics = Arc::new(MetricsCollector::new());

        submit(Job {
            old_file: None,
            new_path: dir.path().join("svc.2024-02-05T00-00-00.log"),
            base_path: base.clone(),
            max_backups: 1,
            link: false,
            metrics: metrics.clone(),
        });
        wait_idle();

        assert_eq!(metrics.get_housekeeping_runs(), 1);
        assert_eq!(list_backups(&base).unwrap().len(), 2);
    }
}
