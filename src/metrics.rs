use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use parking_lot::Mutex;

/// Counters kept by a rotating file writer
#[derive(Debug)]
pub struct MetricsCollector {
    // Write path
    /// Number of successful writes
    write_count: AtomicUsize,
    /// Number of failed writes
    write_errors: AtomicUsize,
    /// Total bytes written
    bytes_written: AtomicU64,
    /// Number of writes forwarded to stderr
    stderr_writes: AtomicUsize,
    /// Number of files opened outside rotation
    file_opens: AtomicUsize,

    // Rotation
    /// Number of successful rotations
    rotation_count: AtomicUsize,
    /// Number of rotations that could not open the next file
    rotation_failures: AtomicUsize,
    /// Total time spent opening files during rotation in nanoseconds
    rotation_duration_ns: AtomicU64,
    /// Time of the last successful rotation
    last_rotation: Mutex<Option<Instant>>,

    // Housekeeping
    /// Number of housekeeping jobs completed
    housekeeping_runs: AtomicUsize,
    /// Number of housekeeping steps that failed
    housekeeping_errors: AtomicUsize,
    /// Number of backups removed by retention
    backups_pruned: AtomicUsize,

    // Internal state
    /// Start time of the metrics collector
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            write_count: AtomicUsize::new(0),
            write_errors: AtomicUsize::new(0),
            bytes_written: AtomicU64::new(0),
            stderr_writes: AtomicUsize::new(0),
            file_opens: AtomicUsize::new(0),

            rotation_count: AtomicUsize::new(0),
            rotation_failures: AtomicUsize::new(0),
            rotation_duration_ns: AtomicU64::new(0),
            last_rotation: Mutex::new(None),

            housekeeping_runs: AtomicUsize::new(0),
            housekeeping_errors: AtomicUsize::new(0),
            backups_pruned: AtomicUsize::new(0),

            start_time: Instant::now(),
        }
    }

    /// Record a successful write of `bytes` bytes
    pub fn record_write(&self, bytes: usize) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Increment the write error count
    pub fn increment_write_errors(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the stderr passthrough count
    pub fn increment_stderr_writes(&self) {
        self.stderr_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the count of files opened on first write
    pub fn increment_file_opens(&self) {
        self.file_opens.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful rotation and how long opening the next file took
    pub fn record_rotation(&self, duration: Duration) {
        self.rotation_count.fetch_add(1, Ordering::Relaxed);
        self.rotation_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        *self.last_rotation.lock() = Some(Instant::now());
    }

    /// Increment the failed rotation count
    pub fn increment_rotation_failures(&self) {
        self.rotation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the completed housekeeping job count
    pub fn increment_housekeeping_runs(&self) {
        self.housekeeping_runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the failed housekeeping step count
    pub fn increment_housekeeping_errors(&self) {
        self.housekeeping_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Add to the pruned backup count
    pub fn add_backups_pruned(&self, count: usize) {
        self.backups_pruned.fetch_add(count, Ordering::Relaxed);
    }

    // Getters

    pub fn get_write_count(&self) -> usize {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn get_write_errors(&self) -> usize {
        self.write_errors.load(Ordering::Relaxed)
    }

    pub fn get_bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn get_stderr_writes(&self) -> usize {
        self.stderr_writes.load(Ordering::Relaxed)
    }

    pub fn get_file_opens(&self) -> usize {
        self.file_opens.load(Ordering::Relaxed)
    }

    pub fn get_rotation_count(&self) -> usize {
        self.rotation_count.load(Ordering::Relaxed)
    }

    pub fn get_rotation_failures(&self) -> usize {
        self.rotation_failures.load(Ordering::Relaxed)
    }

    pub fn get_housekeeping_runs(&self) -> usize {
        self.housekeeping_runs.load(Ordering::Relaxed)
    }

    pub fn get_housekeeping_errors(&self) -> usize {
        self.housekeeping_errors.load(Ordering::Relaxed)
    }

    pub fn get_backups_pruned(&self) -> usize {
        self.backups_pruned.load(Ordering::Relaxed)
    }

    /// Average time spent opening the next file per rotation
    pub fn get_avg_rotation_duration(&self) -> Duration {
        let count = self.get_rotation_count();
        if count == 0 {
            return Duration::from_secs(0);
        }
        Duration::from_nanos(self.rotation_duration_ns.load(Ordering::Relaxed) / count as u64)
    }

    /// Time since the last successful rotation, if any
    pub fn get_time_since_last_rotation(&self) -> Option<Duration> {
        self.last_rotation.lock().map(|at| at.elapsed())
    }

    /// Get uptime of the metrics collector
    pub fn get_uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average bytes per successful write
    pub fn get_avg_write_size(&self) -> f64 {
        let writes = self.get_write_count();
        if writes == 0 {
            return 0.0;
        }
        self.get_bytes_written() as f64 / writes as f64
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.write_count.store(0, Ordering::Relaxed);
        self.write_errors.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.stderr_writes.store(0, Ordering::Relaxed);
        self.file_opens.store(0, Ordering::Relaxed);
        self.rotation_count.store(0, Ordering::Relaxed);
        self.rotation_failures.store(0, Ordering::Relaxed);
        self.rotation_duration_ns.store(0, Ordering::Relaxed);
        *self.last_rotation.lock() = None;
        self.housekeeping_runs.store(0, Ordering::Relaxed);
        self.housekeeping_errors.store(0, Ordering::Relaxed);
        self.backups_pruned.store(0, Ordering::Relaxed);
    }

    /// Get a report of all metrics
    pub fn get_report(&self) -> String {
        let mut report = String::new();

        report.push_str("Write Path:\n");
        report.push_str(&format!("  Writes: {}\n", self.get_write_count()));
        report.push_str(&format!("  Write Errors: {}\n", self.get_write_errors()));
        report.push_str(&format!("  Bytes Written: {}\n", self.get_bytes_written()));
        report.push_str(&format!("  Avg Write Size: {:.2} bytes\n", self.get_avg_write_size()));
        report.push_str(&format!("  Stderr Writes: {}\n", self.get_stderr_writes()));
        report.push_str(&format!("  File Opens: {}\n", self.get_file_opens()));

        report.push_str("\nRotation:\n");
        report.push_str(&format!("  Rotations: {}\n", self.get_rotation_count()));
        report.push_str(&format!("  Failures: {}\n", self.get_rotation_failures()));
        report.push_str(&format!(
            "  Avg Open Time: {:.3} ms\n",
            self.get_avg_rotation_duration().as_secs_f64() * 1000.0
        ));

        report.push_str("\nHousekeeping:\n");
        report.push_str(&format!("  Runs: {}\n", self.get_housekeeping_runs()));
        report.push_str(&format!("  Errors: {}\n", self.get_housekeeping_errors()));
        report.push_str(&format!("  Backups Pruned: {}\n", self.get_backups_pruned()));

        report.push_str(&format!("\nUptime: {:?}\n", self.get_uptime()));

        report
    }
}
