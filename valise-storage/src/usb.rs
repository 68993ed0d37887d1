//! One-time USB mass-storage gadget setup through configfs.
//!
//! Runs once at startup. The gadget tree is created with an empty
//! removable LUN; the mount-external script points the LUN at a
//! volume when the user exposes a drive.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::error::{Result, StorageError};

/// Identity written into the gadget tree.
#[derive(Debug, Clone)]
pub struct GadgetConfig {
    /// pid.codes open-hardware vendor id.
    pub vendor_id: &'static str,
    pub product_id: &'static str,
    pub device_bcd: &'static str,
    pub usb_bcd: &'static str,
    /// Board serial, usually read from /proc/cpuinfo at startup.
    pub serial: String,
    pub manufacturer: &'static str,
    pub product: &'static str,
}

impl Default for GadgetConfig {
    fn default() -> Self {
        GadgetConfig {
            vendor_id: "0x1209",
            product_id: "0x0256",
            device_bcd: "0x0100",
            usb_bcd: "0x0200",
            serial: "0123456789abcdef".to_string(),
            manufacturer: "Valise Project",
            product: "Valise",
        }
    }
}

/// A configured mass-storage gadget rooted in configfs.
#[derive(Debug)]
pub struct UsbGadget {
    root: PathBuf,
    config: GadgetConfig,
}

impl UsbGadget {
    pub fn new(root: impl Into<PathBuf>, config: GadgetConfig) -> Self {
        UsbGadget {
            root: root.into(),
            config,
        }
    }

    fn write_attr(&self, relative: &str, value: &str) -> Result<()> {
        let path = self.root.join(relative);
        fs::write(&path, value).map_err(|source| StorageError::Io { path, source })
    }

    fn make_dir(&self, relative: &str) -> Result<()> {
        let path = self.root.join(relative);
        fs::create_dir_all(&path).map_err(|source| StorageError::Io { path, source })
    }

    /// Build the gadget tree and bind it to the first available USB
    /// device controller.
    pub fn configure(&self) -> Result<()> {
        log::info!("[usb] configuring gadget at {}", self.root.display());
        self.make_dir("")?;
        self.write_attr("idVendor", self.config.vendor_id)?;
        self.write_attr("idProduct", self.config.product_id)?;
        self.write_attr("bcdDevice", self.config.device_bcd)?;
        self.write_attr("bcdUSB", self.config.usb_bcd)?;

        self.make_dir("strings/0x409")?;
        self.write_attr("strings/0x409/serialnumber", &self.config.serial)?;
        self.write_attr("strings/0x409/manufacturer", self.config.manufacturer)?;
        self.write_attr("strings/0x409/product", self.config.product)?;

        self.make_dir("configs/c.1/strings/0x409")?;
        self.write_attr("configs/c.1/strings/0x409/configuration", "Config 1")?;
        self.write_attr("configs/c.1/MaxPower", "250")?;

        // Creating the function directory makes the kernel add lun.0.
        self.make_dir("functions/mass_storage.0")?;
        self.write_attr("functions/mass_storage.0/stall", "1")?;
        self.write_attr("functions/mass_storage.0/lun.0/removable", "1")?;

        let function = self.root.join("functions/mass_storage.0");
        let link = self.root.join("configs/c.1/mass_storage.0");
        if !link.exists() {
            symlink(&function, &link).map_err(|source| StorageError::Io { path: link, source })?;
        }

        self.write_attr("UDC", &first_udc(Path::new("/sys/class/udc"))?)?;
        Ok(())
    }
}

/// Name of the first USB device controller the kernel exposes.
fn first_udc(class_dir: &Path) -> Result<String> {
    let mut entries = fs::read_dir(class_dir).map_err(|source| StorageError::Io {
        path: class_dir.to_path_buf(),
        source,
    })?;
    let entry = entries
        .next()
        .transpose()
        .map_err(|source| StorageError::Io {
            path: class_dir.to_path_buf(),
            source,
        })?
        .ok_or_else(|| StorageError::NoController(class_dir.to_path_buf()))?;
    Ok(entry.file_name().to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_identity() {
        let config = GadgetConfig::default();
        assert_eq!(config.vendor_id, "0x1209");
        assert_eq!(config.product_id, "0x0256");
    }

    #[test]
    fn test_first_udc_picks_an_entry() {
        let dir = std::env::temp_dir().join("valise-udc-test");
        fs::create_dir_all(dir.join("fe980000.usb")).unwrap();
        let udc = first_udc(&dir).unwrap();
        assert_eq!(udc, "fe980000.usb");
    }

    #[test]
    fn test_first_udc_empty_dir_is_an_error() {
        let dir = std::env::temp_dir().join("valise-udc-empty");
        fs::create_dir_all(&dir).unwrap();
        assert!(matches!(
            first_udc(&dir),
            Err(StorageError::NoController(_))
        ));
    }
}
