//! Initial formatting for freshly created drives.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::process::{run_checked, wait_for_path};

/// Filesystem choices offered when creating a drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveFormat {
    Windows,
    Linux,
    Mac,
    Universal,
}

impl DriveFormat {
    /// Every choice, in menu order.
    pub const ALL: [DriveFormat; 4] = [
        DriveFormat::Windows,
        DriveFormat::Linux,
        DriveFormat::Mac,
        DriveFormat::Universal,
    ];

    /// Menu label for the choice.
    pub fn label(&self) -> &'static str {
        match self {
            DriveFormat::Windows => "Windows (NTFS)",
            DriveFormat::Linux => "Linux (EXT3)",
            DriveFormat::Mac => "Mac (EXFAT)",
            DriveFormat::Universal => "Universal (FAT32)",
        }
    }

    /// Partition type written into the partition table.
    fn partition_kind(&self) -> &'static str {
        match self {
            DriveFormat::Linux => "ext3",
            _ => "ntfs",
        }
    }
}

/// Write a partition table and filesystem onto a raw volume.
///
/// The volume gets an msdos label with one primary partition, is
/// loop-attached so the kernel exposes the partition as a device node,
/// formatted and labeled, then detached again.
pub fn format_volume(volume: &Path, format: DriveFormat, label: &str) -> Result<()> {
    log::info!(
        "[format] {} as {} ({})",
        volume.display(),
        format.label(),
        label
    );

    let device = volume.to_string_lossy();
    let mkpart = format!("mkpart primary {} 0% 100%", format.partition_kind());
    run_checked(
        "parted",
        ["--script", device.as_ref(), "mklabel msdos", mkpart.as_str()],
    )?;

    // losetup -f names the device the following attach will claim.
    let loopback = PathBuf::from(run_checked("losetup", ["-f"])?.trim_end());
    run_checked("losetup", ["-fPL", device.as_ref()])?;
    wait_for_path(&loopback, Duration::from_millis(1000))?;

    let loopback_arg = loopback.to_string_lossy().into_owned();
    run_checked("partprobe", [loopback_arg.as_str()])?;

    let partition = format!("{}p1", loopback.display());
    wait_for_path(Path::new(&partition), Duration::from_millis(1000))?;

    match format {
        DriveFormat::Windows => {
            run_checked("mkfs.ntfs", ["-f", partition.as_str()])?;
            run_checked("ntfslabel", [partition.as_str(), label])?;
        }
        DriveFormat::Linux => {
            run_checked("mkfs.ext3", [partition.as_str()])?;
            run_checked("e2label", [partition.as_str(), label])?;
        }
        DriveFormat::Mac => {
            run_checked("mkfs.exfat", [partition.as_str()])?;
            run_checked("exfatlabel", [partition.as_str(), label])?;
        }
        DriveFormat::Universal => {
            run_checked("mkfs.vfat", ["-F", "32", partition.as_str()])?;
            run_checked("fatlabel", [partition.as_str(), label])?;
        }
    }

    run_checked("losetup", ["-d", loopback_arg.as_str()])?;
    Ok(())
}
