//! Ownership restoration for files created by a privileged process.
//!
//! When a program runs under `sudo`, files it creates belong to root. If the
//! invoking user's ids are known from `SUDO_UID`/`SUDO_GID`, new log files and
//! the current-file symlink are handed back to that user.

use std::io;
use std::path::Path;

/// Environment variable carrying the invoking user's id
pub const UID_VAR: &str = "SUDO_UID";
/// Environment variable carrying the invoking user's group id
pub const GID_VAR: &str = "SUDO_GID";

/// Non-root owner to give new files to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipHint {
    pub uid: u32,
    pub gid: u32,
}

impl OwnershipHint {
    /// Read the hint from the environment.
    ///
    /// Returns `None` unless the process runs with an effective uid of 0 and
    /// both variables hold non-zero ids.
    pub fn from_env() -> Option<Self> {
        if !is_privileged() {
            return None;
        }
        let uid = std::env::var(UID_VAR).ok();
        let gid = std::env::var(GID_VAR).ok();
        Self::from_vars(uid.as_deref(), gid.as_deref())
    }

    /// Parse a hint from raw variable values; unparsable values count as 0
    pub fn from_vars(uid: Option<&str>, gid: Option<&str>) -> Option<Self> {
        let parse = |v: Option<&str>| v.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(0);
        let (uid, gid) = (parse(uid), parse(gid));
        if uid == 0 || gid == 0 {
            return None;
        }
        Some(Self { uid, gid })
    }

    /// Change the owner of `link` (without following it) and of `file`.
    ///
    /// Both changes are attempted; the first failure is returned.
    pub fn apply(&self, link: Option<&Path>, file: &Path) -> io::Result<()> {
        let link_result = match link {
            Some(link) => lchown(link, self.uid, self.gid),
            None => Ok(()),
        };
        let file_result = chown(file, self.uid, self.gid);
        link_result.and(file_result)
    }
}

#[cfg(unix)]
fn is_privileged() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_privileged() -> bool {
    false
}

#[cfg(unix)]
fn lchown(path: &Path, uid: u32, gid: u32) -> io::Result<()> {
    std::os::unix::fs::lchown(path, Some(uid), Some(gid))
}

#[cfg(unix)]
fn chown(path: &Path, uid: u32, gid: u32) -> io::Result<()> {
    std::os::unix::fs::chown(path, Some(uid), Some(gid))
}

#[cfg(not(unix))]
fn lchown(_path: &Path, _uid: u32, _gid: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn chown(_path: &Path, _uid: u32, _gid: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_requires_both_ids() {
        assert_eq!(
            OwnershipHint::from_vars(Some("1000"), Some("1000")),
            Some(OwnershipHint { uid: 1000, gid: 1000 })
        );
        assert_eq!(OwnershipHint::from_vars(Some("1000"), None), None);
        assert_eq!(OwnershipHint::from_vars(None, Some("1000")), None);
        assert_eq!(OwnershipHint::from_vars(Some("0"), Some("1000")), None);
        assert_eq!(OwnershipHint::from_vars(Some("abc"), Some("1000")), None);
        assert_eq!(
            OwnershipHint::from_vars(Some(" 501 "), Some("20")),
            Some(OwnershipHint { uid: 501, gid: 20 })
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let hint = OwnershipHint { uid: 1000, gid: 1000 };

        assert!(hint.apply(None, &dir.path().join("missing.log")).is_err());
    }
}
