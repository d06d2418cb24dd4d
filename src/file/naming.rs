//! File naming for rotated logs
//!
//! A file written for base path `dir/name.ext` is called
//! `dir/name.<timestamp>[.<host>|.<pid>|.<host>-<pid>].ext`. The timestamp is
//! formatted so that sorting names as strings sorts them by rotation time.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use glob::Pattern;

use crate::host::HostIdentity;

/// Timestamp layout, including the leading separator
pub const TIMESTAMP_FORMAT: &str = ".%Y-%m-%dT%H-%M-%S";

/// Format a rotation time for use in a file name
pub fn format_timestamp(now: DateTime<Utc>, local_time: bool) -> String {
    if local_time {
        now.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
    } else {
        now.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// The host and/or pid segment of a file name, without the leading dot
pub fn identity_tag(identity: &HostIdentity, host_name: bool, process_id: bool) -> Option<String> {
    match (host_name, process_id) {
        (true, true) => Some(format!("{}-{}", identity.hostname(), identity.pid())),
        (true, false) => Some(identity.hostname().to_string()),
        (false, true) => Some(identity.pid().to_string()),
        (false, false) => None,
    }
}

/// Build the path of a timestamped file next to `base`
pub fn backup_path(base: &Path, timestamp: &str, tag: Option<&str>) -> PathBuf {
    let mut name = OsString::from(base.file_stem().unwrap_or_default());
    name.push(timestamp);
    if let Some(tag) = tag {
        name.push(".");
        name.push(tag);
    }
    if let Some(ext) = base.extension() {
        name.push(".");
        name.push(ext);
    }
    base.with_file_name(name)
}

/// Glob pattern matching every timestamped file of `base`
pub fn backup_pattern(base: &Path) -> String {
    let stem = base.file_stem().unwrap_or_default();
    let mut pattern = Pattern::escape(&base.with_file_name(stem).to_string_lossy());
    pattern.push_str(".20*");
    if let Some(ext) = base.extension() {
        pattern.push_str(&Pattern::escape(&format!(".{}", ext.to_string_lossy())));
    }
    pattern
}
