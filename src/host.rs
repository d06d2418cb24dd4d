//! Host identity
//!
//! Resolves the host label and machine fingerprint used to tell apart log files
//! written by different machines or containers into the same directory.
//! Resolution happens once per process; every writer shares the result.

use std::fmt;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use rand::Rng;
use tracing::debug;

/// Seed files that carry a stable machine identifier on this platform
#[cfg(target_os = "linux")]
const SEED_FILES: &[&str] = &["/etc/machine-id", "/proc/self/cpuset"];
#[cfg(target_os = "freebsd")]
const SEED_FILES: &[&str] = &["/etc/hostid"];
#[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
const SEED_FILES: &[&str] = &[];

/// Upper bound (exclusive) of the random suffix of synthetic host labels
const SYNTHETIC_RANGE: u32 = 1_000_000;

static GLOBAL: Lazy<HostIdentity> = Lazy::new(HostIdentity::resolve);

/// Host label, machine fingerprint and process id of the running process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    hostname: String,
    machine: [u8; 16],
    pid: u32,
}

impl HostIdentity {
    /// Create an identity from known parts
    pub fn new(hostname: impl Into<String>, machine: [u8; 16], pid: u32) -> Self {
        Self {
            hostname: hostname.into(),
            machine,
            pid,
        }
    }

    /// The process-wide identity, resolved on first use
    pub fn global() -> &'static HostIdentity {
        &GLOBAL
    }

    /// Resolve the identity of the running process
    pub fn resolve() -> Self {
        let seeds: Vec<&Path> = SEED_FILES.iter().map(Path::new).collect();
        let identity = Self::resolve_with(os_hostname(), &seeds, std::process::id());

        debug!(
            hostname = %identity.hostname,
            machine = %identity.machine_hex(),
            pid = identity.pid,
            "resolved host identity"
        );

        identity
    }

    /// Resolve an identity from an OS hostname and a list of seed files.
    ///
    /// Missing or generic hostnames are replaced by a synthetic
    /// `localhost-<n>` label. Unreadable seed files are skipped.
    pub fn resolve_with(hostname: Option<String>, seed_files: &[&Path], pid: u32) -> Self {
        let hostname = match hostname {
            Some(name) if !is_generic_hostname(&name) => name,
            _ => synthetic_hostname(),
        };

        let mut data = hostname.as_bytes().to_vec();
        for file in seed_files {
            if let Ok(bytes) = fs::read(file) {
                data.extend_from_slice(&bytes);
            }
        }
        let machine = md5::compute(&data).0;

        Self {
            hostname,
            machine,
            pid,
        }
    }

    /// Host label embedded in file names
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Machine fingerprint
    pub fn machine(&self) -> &[u8; 16] {
        &self.machine
    }

    /// Machine fingerprint as lowercase hex
    pub fn machine_hex(&self) -> String {
        format!("{:x}", md5::Digest(self.machine))
    }

    /// Process id embedded in file names
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.hostname, self.pid)
    }
}

/// Whether a hostname is too generic to tell hosts apart
fn is_generic_hostname(name: &str) -> bool {
    name.is_empty() || name.starts_with("localhost")
}

fn synthetic_hostname() -> String {
    let n = rand::thread_rng().gen_range(0..SYNTHETIC_RANGE);
    format!("localhost-{}", n)
}

#[cfg(unix)]
fn os_hostname() -> Option<String> {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
}

#[cfg(not(unix))]
fn os_hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok()
}
