//! Image rows under an internally mounted drive.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pixeldom::{mount_indicator, Bitmap, EventHandler, EventResult, RenderMode, Renderable};
use valise_storage::{MountHost, Result, StorageError};

use super::render_row;

/// One disk image found on a drive, individually exportable over the
/// per-image mount script.
pub struct IsoEntry {
    path: PathBuf,
    mounted: bool,
    focused: bool,
    host: Arc<dyn MountHost>,
}

impl IsoEntry {
    pub fn new(path: PathBuf, host: Arc<dyn MountHost>) -> Self {
        Self {
            path,
            mounted: false,
            focused: false,
            host,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Export the image. Mounting an already mounted image is an error,
    /// unlike the drive-level precondition no-ops.
    pub fn mount(&mut self) -> Result<()> {
        log::debug!("[mount] image {}", self.path.display());
        if self.mounted {
            return Err(StorageError::ImageAlreadyMounted(self.path.clone()));
        }
        self.host.mount_image(&self.path)?;
        self.mounted = true;
        Ok(())
    }

    pub fn unmount(&mut self) -> Result<()> {
        log::debug!("[mount] image {} unmount", self.path.display());
        if !self.mounted {
            return Err(StorageError::ImageNotMounted(self.path.clone()));
        }
        self.host.unmount_image(&self.path)?;
        self.mounted = false;
        Ok(())
    }
}

impl EventHandler for IsoEntry {
    fn select(&mut self) -> EventResult {
        let result = if self.mounted {
            self.unmount()
        } else {
            self.mount()
        };
        if let Err(err) = result {
            log::error!("[mount] image {}: {err}", self.path.display());
        }
        EventResult::Consumed
    }

    fn focus(&mut self) -> EventResult {
        self.focused = true;
        EventResult::Consumed
    }

    fn lose_focus(&mut self) -> EventResult {
        self.focused = false;
        EventResult::Consumed
    }
}

impl Renderable for IsoEntry {
    fn render(&self) -> (Bitmap, RenderMode) {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        let mut row = render_row(&name, self.focused);
        if self.mounted {
            row.blit(&mount_indicator(), (6, 0), true);
        }
        (row, RenderMode::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::fakes::FakeHost;

    fn entry(host: &Arc<FakeHost>) -> IsoEntry {
        IsoEntry::new(
            PathBuf::from("/mnt/volume0/disc.iso"),
            Arc::clone(host) as Arc<dyn MountHost>,
        )
    }

    #[test]
    fn test_select_toggles_mount() {
        let host = Arc::new(FakeHost::default());
        let mut iso = entry(&host);

        assert!(iso.select().is_consumed());
        assert!(iso.is_mounted());
        assert!(iso.select().is_consumed());
        assert!(!iso.is_mounted());
        assert_eq!(
            host.calls(),
            vec![
                "mount-image /mnt/volume0/disc.iso",
                "unmount-image /mnt/volume0/disc.iso",
            ]
        );
    }

    #[test]
    fn test_double_mount_is_an_error() {
        let host = Arc::new(FakeHost::default());
        let mut iso = entry(&host);
        iso.mount().unwrap();
        assert!(matches!(
            iso.mount(),
            Err(StorageError::ImageAlreadyMounted(_))
        ));
        assert!(iso.is_mounted());
    }

    #[test]
    fn test_unmount_unmounted_is_an_error() {
        let host = Arc::new(FakeHost::default());
        let mut iso = entry(&host);
        assert!(matches!(iso.unmount(), Err(StorageError::ImageNotMounted(_))));
    }

    #[test]
    fn test_render_marks_mounted_state() {
        let host = Arc::new(FakeHost::default());
        let mut iso = entry(&host);
        let (plain, _) = iso.render();
        iso.mount().unwrap();
        let (marked, _) = iso.render();
        assert_ne!(plain, marked);
    }
}
