pub mod error;
pub mod format;
pub mod lvm;
pub mod process;
pub mod scripts;
pub mod usb;

pub use error::{Result, StorageError};
pub use format::{format_volume, DriveFormat};
pub use lvm::{LogicalVolume, LogicalVolumeReport, VolumeGroup, VolumeManager};
pub use scripts::{MountHost, ShellScripts};
pub use usb::{GadgetConfig, UsbGadget};
