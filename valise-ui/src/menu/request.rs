//! Deferred work handed from menu rows to the main loop.

use valise_storage::DriveFormat;

/// Work a row cannot run inline while the tree is borrowed for event
/// routing. Rows buffer one of these; the main loop drains them after
/// dispatch and runs each under the root lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuRequest {
    /// Allocate and format a new drive of `size` bytes.
    CreateDrive { size: u64, format: DriveFormat },
    /// Unmount and delete the named drive.
    RemoveDrive(String),
    /// Snapshot the named drive.
    SnapshotDrive(String),
    /// Flip the panel orientation and the up/down mapping.
    FlipDisplay,
}
