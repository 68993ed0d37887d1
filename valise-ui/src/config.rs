//! Runtime configuration.
//!
//! The script paths come from the environment and are required. The
//! tuning knobs come from an optional TOML file. A missing file means
//! defaults, a file that fails to parse is fatal.

use std::io;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;

use crate::error::{Result, UiError};

const DEFAULT_CONFIG_PATH: &str = "/boot/valise.toml";

/// Menu tuning knobs.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Percent step applied by up/down while sizing a new drive.
    pub size_step: i64,
    /// Percent preselected when the sizing screen opens.
    pub default_percent: i64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            size_step: 10,
            default_percent: 50,
        }
    }
}

/// Volume group selection.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Name of the LVM volume group holding the thin pool.
    pub volume_group: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            volume_group: "VolGroup00".into(),
        }
    }
}

/// Parsed contents of the config file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ui: UiConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load the config file named by `VALISE_CONFIG`, or the default path.
    pub fn load() -> Result<Self> {
        let path = env::var_os("VALISE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::from_path(&path)
    }

    fn from_path(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("[config] no file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(UiError::config(format!("{}: {err}", path.display()))),
        };
        toml::from_str(&raw).map_err(|err| UiError::config(format!("{}: {err}", path.display())))
    }
}

/// Helper script locations, all taken from the environment.
#[derive(Clone, Debug)]
pub struct Scripts {
    pub drive_script: PathBuf,
    pub image_script: PathBuf,
    pub mount_root: PathBuf,
}

impl Scripts {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            drive_script: required_env("VALISE_DRIVE_SCRIPT")?,
            image_script: required_env("VALISE_IMAGE_SCRIPT")?,
            mount_root: required_env("VALISE_MOUNT_ROOT")?,
        })
    }
}

fn required_env(name: &str) -> Result<PathBuf> {
    env::var_os(name)
        .map(PathBuf::from)
        .ok_or_else(|| UiError::config(format!("{name} is not set")))
}
