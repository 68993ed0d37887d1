//! Storage error types

use std::io;
use std::path::PathBuf;
use std::process::Output;

/// Convenience alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by the volume manager, the mount scripts and the
/// drive formatter.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An external command exited with a nonzero status.
    #[error("{command} failed ({status}): {stderr}")]
    Command {
        /// The program that failed.
        command: String,
        /// Its exit status, -1 when killed by a signal.
        status: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// An external command could not be started at all.
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// The program that could not be spawned.
        command: String,
        #[source]
        source: io::Error,
    },

    /// The volume manager emitted a report this build cannot parse.
    #[error("malformed {report} report: {source}")]
    Report {
        /// Which report was being parsed.
        report: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem work around mount points or the gadget tree failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The path being touched.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The named volume is missing from the latest report.
    #[error("no volume named {0}")]
    MissingVolume(String),

    /// The volume group carries no thin pool.
    #[error("volume group {0} has no thin pool")]
    MissingPool(String),

    /// The volume group path has no final name component.
    #[error("volume group path {} has no name", .0.display())]
    BadGroupPath(PathBuf),

    /// Mount was requested for an image that is already mounted.
    #[error("image {} is already mounted", .0.display())]
    ImageAlreadyMounted(PathBuf),

    /// Unmount was requested for an image that is not mounted.
    #[error("image {} is not mounted", .0.display())]
    ImageNotMounted(PathBuf),

    /// A device node failed to appear in time.
    #[error("timed out waiting for {}", .0.display())]
    PathTimeout(PathBuf),

    /// No USB device controller is available to bind the gadget to.
    #[error("no usb device controller found under {}", .0.display())]
    NoController(PathBuf),
}

impl StorageError {
    /// Builds a command failure from a finished process.
    pub fn command_failed(command: impl Into<String>, output: &Output) -> Self {
        Self::Command {
            command: command.into(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Whether the error signals an unrecoverable inconsistency with
    /// the external system rather than a failed operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Report { .. })
    }
}
