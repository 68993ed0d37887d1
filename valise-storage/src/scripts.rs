//! Mount script invocation.
//!
//! Drives are moved between mount states by an on-disk script taking a
//! verb plus positional arguments; individual images are mounted by a
//! second script. The scripts are configuration, not code, so the menu
//! consumes them through the [`MountHost`] trait and tests substitute
//! a recording fake.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StorageError};
use crate::process::run_checked;

/// Mount operations the menu invokes on the appliance.
pub trait MountHost: Send + Sync {
    /// Mount a volume for on-device inspection. Returns the image
    /// paths the script discovered, one per stdout line.
    fn mount_internal(&self, volume: &str) -> Result<Vec<PathBuf>>;

    /// Undo an internal mount.
    fn unmount_internal(&self, volume: &str) -> Result<()>;

    /// Expose a volume over the mass-storage gadget.
    fn mount_external(&self, volume: &str) -> Result<()>;

    /// Withdraw a volume from the gadget.
    fn unmount_external(&self, volume: &str) -> Result<()>;

    /// Loop-mount a single image so the gadget can serve it.
    fn mount_image(&self, image: &Path) -> Result<()>;

    /// Unmount a single image.
    fn unmount_image(&self, image: &Path) -> Result<()>;
}

/// The live [`MountHost`]: two executables plus the directory volumes
/// are mounted under.
#[derive(Debug, Clone)]
pub struct ShellScripts {
    drive_script: PathBuf,
    image_script: PathBuf,
    mount_root: PathBuf,
}

impl ShellScripts {
    pub fn new(
        drive_script: impl Into<PathBuf>,
        image_script: impl Into<PathBuf>,
        mount_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            drive_script: drive_script.into(),
            image_script: image_script.into(),
            mount_root: mount_root.into(),
        }
    }

    /// Where `volume` is (or would be) mounted internally.
    pub fn mount_point(&self, volume: &str) -> PathBuf {
        self.mount_root.join(volume)
    }

    fn run_drive(&self, args: &[&str]) -> Result<String> {
        run_checked(&self.drive_script.to_string_lossy(), args.iter().copied())
    }

    fn run_image(&self, args: &[&str]) -> Result<String> {
        run_checked(&self.image_script.to_string_lossy(), args.iter().copied())
    }
}

impl MountHost for ShellScripts {
    fn mount_internal(&self, volume: &str) -> Result<Vec<PathBuf>> {
        let mount_point = self.mount_point(volume);
        fs::create_dir_all(&mount_point).map_err(|source| StorageError::Io {
            path: mount_point.clone(),
            source,
        })?;

        let mount_point_arg = mount_point.to_string_lossy();
        let stdout = self.run_drive(&["mount-internal", volume, &mount_point_arg])?;
        let images: Vec<PathBuf> = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();
        log::debug!(
            "[mount] {} mounted internal at {}, {} image(s)",
            volume,
            mount_point.display(),
            images.len()
        );
        Ok(images)
    }

    fn unmount_internal(&self, volume: &str) -> Result<()> {
        let mount_point_arg = self.mount_point(volume).to_string_lossy().into_owned();
        self.run_drive(&["unmount-internal", &mount_point_arg])?;
        log::debug!("[mount] {} unmounted internal", volume);
        Ok(())
    }

    fn mount_external(&self, volume: &str) -> Result<()> {
        self.run_drive(&["mount-external", volume])?;
        log::debug!("[mount] {} mounted external", volume);
        Ok(())
    }

    fn unmount_external(&self, volume: &str) -> Result<()> {
        self.run_drive(&["unmount-external", volume])?;
        log::debug!("[mount] {} unmounted external", volume);
        Ok(())
    }

    fn mount_image(&self, image: &Path) -> Result<()> {
        let image_arg = image.to_string_lossy();
        self.run_image(&["mount", &image_arg])?;
        log::debug!("[mount] image {} mounted", image.display());
        Ok(())
    }

    fn unmount_image(&self, image: &Path) -> Result<()> {
        let image_arg = image.to_string_lossy();
        self.run_image(&["unmount", &image_arg])?;
        log::debug!("[mount] image {} unmounted", image.display());
        Ok(())
    }
}
