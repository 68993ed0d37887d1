//! Canned storage backends for menu tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use valise_storage::{
    LogicalVolume, LogicalVolumeReport, MountHost, Result, StorageError, VolumeManager,
};

/// Build a plausible `lvs` report row.
pub fn report(name: &str, attr: &str, size: u64, data_percent: f64) -> LogicalVolumeReport {
    LogicalVolumeReport {
        lv_name: name.to_string(),
        vg_name: "VolGroup00".to_string(),
        lv_attr: attr.to_string(),
        lv_size: size,
        pool_lv: String::new(),
        origin: String::new(),
        data_percent,
        lv_uuid: format!("uuid-{name}"),
    }
}

/// Build the volume record discovery would produce for `name`.
pub fn volume(name: &str) -> LogicalVolume {
    LogicalVolume {
        name: name.to_string(),
        path: PathBuf::from(format!("/dev/VolGroup00/{name}")),
        size: 50 * 1024 * 1024 * 1024,
        uuid: format!("uuid-{name}"),
    }
}

/// Volume manager over canned report rows, recording every mutation.
pub struct FakeManager {
    reports: Vec<LogicalVolumeReport>,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl FakeManager {
    pub fn new(reports: Vec<LogicalVolumeReport>) -> Self {
        Self {
            reports,
            log: Arc::default(),
        }
    }
}

impl VolumeManager for FakeManager {
    fn volumes(&self) -> Result<Vec<LogicalVolume>> {
        Ok(self
            .reports
            .iter()
            .filter(|report| report.is_virtual())
            .map(|report| LogicalVolume {
                name: report.lv_name.clone(),
                path: PathBuf::from(format!("/dev/{}/{}", report.vg_name, report.lv_name)),
                size: report.lv_size,
                uuid: report.lv_uuid.clone(),
            })
            .collect())
    }

    fn pool(&self) -> Result<LogicalVolumeReport> {
        self.reports
            .iter()
            .find(|report| report.is_pool())
            .cloned()
            .ok_or_else(|| StorageError::MissingPool("VolGroup00".to_string()))
    }

    fn create_volume(&mut self, name: &str, size: u64) -> Result<LogicalVolume> {
        self.log
            .lock()
            .unwrap()
            .push(format!("create {name} {size}"));
        self.reports.push(report(name, "Vwi-a-tz--", size, 0.0));
        Ok(LogicalVolume {
            name: name.to_string(),
            path: PathBuf::from(format!("/dev/VolGroup00/{name}")),
            size,
            uuid: format!("uuid-{name}"),
        })
    }

    fn snapshot_volume(&mut self, name: &str) -> Result<LogicalVolume> {
        self.log.lock().unwrap().push(format!("snapshot {name}"));
        Ok(volume(&format!("{name}-backup")))
    }

    fn delete_volume(&mut self, name: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("delete {name}"));
        self.reports.retain(|report| report.lv_name != name);
        Ok(())
    }
}

/// Mount host recording script invocations, optionally failing them.
#[derive(Default)]
pub struct FakeHost {
    images: Vec<String>,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn with_images(names: &[&str]) -> Self {
        Self {
            images: names.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail {
            return Err(StorageError::Command {
                command: call,
                status: 1,
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl MountHost for FakeHost {
    fn mount_internal(&self, volume: &str) -> Result<Vec<PathBuf>> {
        self.record(format!("mount-internal {volume}"))?;
        Ok(self
            .images
            .iter()
            .map(|name| PathBuf::from(format!("/mnt/{volume}/{name}")))
            .collect())
    }

    fn unmount_internal(&self, volume: &str) -> Result<()> {
        self.record(format!("unmount-internal {volume}"))
    }

    fn mount_external(&self, volume: &str) -> Result<()> {
        self.record(format!("mount-external {volume}"))
    }

    fn unmount_external(&self, volume: &str) -> Result<()> {
        self.record(format!("unmount-external {volume}"))
    }

    fn mount_image(&self, image: &Path) -> Result<()> {
        self.record(format!("mount-image {}", image.display()))
    }

    fn unmount_image(&self, image: &Path) -> Result<()> {
        self.record(format!("unmount-image {}", image.display()))
    }
}
