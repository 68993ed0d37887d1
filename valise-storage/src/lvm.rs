//! Volume manager interface over the LVM command line tools.
//!
//! Reports are requested with `--report-format=json --units=B` and
//! arrive with every field string-typed, so numeric fields go through
//! the `from_str` deserializers below. Thin virtual volumes (the
//! drives) carry attr marker 'V'; the backing pool carries 't'.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use serde::de::{self, Deserializer};

use crate::error::{Result, StorageError};
use crate::process::run_checked;

fn from_str<'de, T, D>(deserializer: D) -> std::result::Result<T, D::Error>
where
    T: FromStr + Default,
    T::Err: Display,
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        Ok(T::default())
    } else {
        T::from_str(&s).map_err(de::Error::custom)
    }
}

/// Sizes are printed as "12345B"; parse with the unit suffix stripped.
fn from_str_strip_unit<'de, T, D>(deserializer: D) -> std::result::Result<T, D::Error>
where
    T: FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    T::from_str(s.trim_matches('B')).map_err(de::Error::custom)
}

/// One row of the `lvs` report.
#[derive(Debug, Clone, Deserialize)]
pub struct LogicalVolumeReport {
    pub lv_name: String,
    pub vg_name: String,
    pub lv_attr: String,

    #[serde(deserialize_with = "from_str_strip_unit")]
    pub lv_size: u64,

    #[serde(default)]
    pub pool_lv: String,

    #[serde(default)]
    pub origin: String,

    #[serde(deserialize_with = "from_str", default)]
    pub data_percent: f64,

    #[serde(default)]
    pub lv_uuid: String,
}

impl LogicalVolumeReport {
    /// Whether this row is a thin virtual volume, i.e. a drive.
    pub fn is_virtual(&self) -> bool {
        self.lv_attr.starts_with('V')
    }

    /// Whether this row is the thin pool backing the drives.
    pub fn is_pool(&self) -> bool {
        self.lv_attr.starts_with(['t', 'T'])
    }
}

/// One row of the `vgs` report.
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeGroupReport {
    pub vg_name: String,

    #[serde(deserialize_with = "from_str_strip_unit")]
    pub vg_size: u64,

    #[serde(deserialize_with = "from_str_strip_unit")]
    pub vg_free: u64,

    #[serde(default)]
    pub vg_uuid: String,
}

/// A discovered or newly created thin volume, with the attributes the
/// menu caches at discovery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalVolume {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub uuid: String,
}

impl LogicalVolume {
    fn from_report(group_path: &Path, report: LogicalVolumeReport) -> LogicalVolume {
        LogicalVolume {
            path: group_path.join(&report.lv_name),
            name: report.lv_name,
            size: report.lv_size,
            uuid: report.lv_uuid,
        }
    }
}

/// Interface to the external volume manager.
///
/// The live implementation shells out to LVM; tests substitute canned
/// reports behind the same trait.
pub trait VolumeManager: Send {
    /// All thin virtual volumes in the group.
    fn volumes(&self) -> Result<Vec<LogicalVolume>>;

    /// The thin pool backing the group.
    fn pool(&self) -> Result<LogicalVolumeReport>;

    /// Total pool capacity in bytes.
    fn pool_size(&self) -> Result<u64> {
        Ok(self.pool()?.lv_size)
    }

    /// Percent of the pool's data space in use.
    fn percent_used(&self) -> Result<f64> {
        Ok(self.pool()?.data_percent)
    }

    /// Create a thin volume of `size` bytes.
    fn create_volume(&mut self, name: &str, size: u64) -> Result<LogicalVolume>;

    /// Snapshot `name` as an activated `<name>-backup` volume.
    fn snapshot_volume(&mut self, name: &str) -> Result<LogicalVolume>;

    /// Deactivate and remove a volume. It must not be mounted.
    fn delete_volume(&mut self, name: &str) -> Result<()>;
}

fn parse_report<T>(raw: &str, report: &'static str, key: &str) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut value: serde_json::Value =
        serde_json::from_str(raw).map_err(|source| StorageError::Report { report, source })?;
    serde_json::from_value(value["report"][0][key].take())
        .map_err(|source| StorageError::Report { report, source })
}

fn lvs() -> Result<Vec<LogicalVolumeReport>> {
    let raw = run_checked("lvs", ["--verbose", "--report-format=json", "--units=B"])?;
    parse_report(&raw, "lvs", "lv")
}

fn vgs() -> Result<Vec<VolumeGroupReport>> {
    let raw = run_checked("vgs", ["--verbose", "--report-format=json", "--units=B"])?;
    parse_report(&raw, "vgs", "vg")
}

/// An LVM volume group addressed by its /dev path.
#[derive(Debug, Clone)]
pub struct VolumeGroup {
    name: String,
    path: PathBuf,
}

impl VolumeGroup {
    /// Build from a device path such as `/dev/VolGroup00`; the group
    /// name is the final path component.
    pub fn from_path(path: impl AsRef<Path>) -> Result<VolumeGroup> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .ok_or_else(|| StorageError::BadGroupPath(path.to_path_buf()))?
            .to_string_lossy()
            .into_owned();
        Ok(VolumeGroup {
            name,
            path: path.to_path_buf(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The group's own `vgs` row. Used at startup to fail fast when
    /// the configured group does not exist.
    pub fn report(&self) -> Result<VolumeGroupReport> {
        vgs()?
            .into_iter()
            .find(|vg| vg.vg_name == self.name)
            .ok_or_else(|| StorageError::MissingVolume(self.name.clone()))
    }
}

impl VolumeManager for VolumeGroup {
    fn volumes(&self) -> Result<Vec<LogicalVolume>> {
        Ok(lvs()?
            .into_iter()
            .filter(|lv| lv.vg_name == self.name && lv.is_virtual())
            .map(|lv| LogicalVolume::from_report(&self.path, lv))
            .collect())
    }

    fn pool(&self) -> Result<LogicalVolumeReport> {
        lvs()?
            .into_iter()
            .find(|lv| lv.vg_name == self.name && lv.is_pool())
            .ok_or_else(|| StorageError::MissingPool(self.name.clone()))
    }

    fn create_volume(&mut self, name: &str, size: u64) -> Result<LogicalVolume> {
        log::info!("[lvm] creating {} ({}B) in {}", name, size, self.name);
        let size_arg = format!("{}B", size);
        let pool_arg = format!("{}/thinpool", self.name);
        run_checked(
            "lvcreate",
            ["-V", size_arg.as_str(), "-T", pool_arg.as_str(), "-n", name],
        )?;

        self.volumes()?
            .into_iter()
            .find(|lv| lv.name == name)
            .ok_or_else(|| StorageError::MissingVolume(name.to_string()))
    }

    fn snapshot_volume(&mut self, name: &str) -> Result<LogicalVolume> {
        let snapshot = format!("{}-backup", name);
        log::info!("[lvm] snapshotting {} as {}", name, snapshot);
        let origin = format!("{}/{}", self.name, name);
        run_checked(
            "lvcreate",
            [origin.as_str(), "-n", snapshot.as_str(), "-s"],
        )?;

        // Snapshots inherit the skip-activation bit; clear it and
        // activate so the volume is immediately usable.
        let target = format!("{}/{}", self.name, snapshot);
        run_checked("lvchange", ["-kn", "-ay", target.as_str()])?;

        self.volumes()?
            .into_iter()
            .find(|lv| lv.name == snapshot)
            .ok_or(StorageError::MissingVolume(snapshot))
    }

    fn delete_volume(&mut self, name: &str) -> Result<()> {
        // The volume must not be mounted at this point.
        let volume = format!("{}/{}", self.name, name);
        log::info!("[lvm] removing {}", volume);
        run_checked("lvchange", ["-a", "n", volume.as_str()])?;
        run_checked("lvremove", [volume.as_str(), "-y"])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LVS_FIXTURE: &str = r#"{
        "report": [{
            "lv": [
                {"lv_name": "thinpool", "vg_name": "VolGroup00",
                 "lv_attr": "twi-aotz--", "lv_size": "107374182400B",
                 "pool_lv": "", "origin": "", "data_percent": "37.50",
                 "lv_uuid": "pool-uuid"},
                {"lv_name": "volume0", "vg_name": "VolGroup00",
                 "lv_attr": "Vwi-aotz--", "lv_size": "53687091200B",
                 "pool_lv": "thinpool", "origin": "", "data_percent": "12.04",
                 "lv_uuid": "vol-uuid"}
            ]
        }]
    }"#;

    const VGS_FIXTURE: &str = r#"{
        "report": [{
            "vg": [
                {"vg_name": "VolGroup00", "vg_size": "128849018880B",
                 "vg_free": "21474836480B", "vg_uuid": "vg-uuid"}
            ]
        }]
    }"#;

    #[test]
    fn test_parse_lvs_report() {
        let rows: Vec<LogicalVolumeReport> = parse_report(LVS_FIXTURE, "lvs", "lv").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].lv_name, "thinpool");
        assert_eq!(rows[0].lv_size, 107374182400);
        assert!((rows[0].data_percent - 37.50).abs() < f64::EPSILON);
        assert!(rows[0].is_pool());
        assert!(!rows[0].is_virtual());
        assert!(rows[1].is_virtual());
        assert!(!rows[1].is_pool());
    }

    #[test]
    fn test_parse_vgs_report() {
        let rows: Vec<VolumeGroupReport> = parse_report(VGS_FIXTURE, "vgs", "vg").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vg_name, "VolGroup00");
        assert_eq!(rows[0].vg_size, 128849018880);
        assert_eq!(rows[0].vg_free, 21474836480);
    }

    #[test]
    fn test_parse_report_rejects_garbage() {
        let err = parse_report::<LogicalVolumeReport>("not json", "lvs", "lv").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_numeric_fields_default() {
        let raw = r#"{"report": [{"lv": [
            {"lv_name": "v", "vg_name": "g", "lv_attr": "Vwi---",
             "lv_size": "1024B", "pool_lv": "", "origin": "",
             "data_percent": "", "lv_uuid": ""}
        ]}]}"#;
        let rows: Vec<LogicalVolumeReport> = parse_report(raw, "lvs", "lv").unwrap();
        assert_eq!(rows[0].data_percent, 0.0);
    }

    #[test]
    fn test_uppercase_pool_attr_is_recognized() {
        let raw = r#"{"report": [{"lv": [
            {"lv_name": "thinpool", "vg_name": "g", "lv_attr": "Twi---",
             "lv_size": "1024B", "data_percent": "0"}
        ]}]}"#;
        let rows: Vec<LogicalVolumeReport> = parse_report(raw, "lvs", "lv").unwrap();
        assert!(rows[0].is_pool());
    }

    #[test]
    fn test_volume_group_name_from_path() {
        let vg = VolumeGroup::from_path("/dev/VolGroup00").unwrap();
        assert_eq!(vg.name(), "VolGroup00");
        assert_eq!(vg.path(), Path::new("/dev/VolGroup00"));
    }

    #[test]
    fn test_volume_group_path_without_name_is_rejected() {
        assert!(VolumeGroup::from_path("/").is_err());
    }

    #[test]
    fn test_logical_volume_from_report_joins_group_path() {
        let rows: Vec<LogicalVolumeReport> = parse_report(LVS_FIXTURE, "lvs", "lv").unwrap();
        let volume =
            LogicalVolume::from_report(Path::new("/dev/VolGroup00"), rows[1].clone());
        assert_eq!(volume.name, "volume0");
        assert_eq!(volume.path, PathBuf::from("/dev/VolGroup00/volume0"));
        assert_eq!(volume.size, 53687091200);
        assert_eq!(volume.uuid, "vol-uuid");
    }
}
