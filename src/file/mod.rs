//! Rotating file output
//!
//! [`FileWriter`] appends to timestamped files and rotates once a size limit is
//! crossed. Cleanup after a rotation (closing the old handle, re-pointing the
//! current-file symlink, restoring ownership and pruning old files) runs on a
//! background worker, see [`housekeeping`].

mod clock;
pub mod housekeeping;
pub mod naming;
mod ownership;
mod writer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use housekeeping::{list_backups, prune_backups, wait_idle, PruneOutcome};
pub use ownership::OwnershipHint;
pub use writer::FileWriter;
