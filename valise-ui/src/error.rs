//! Error types for the UI binary.

pub type Result<T> = std::result::Result<T, UiError>;

/// Errors surfaced by the menu binary itself.
///
/// Storage failures pass through unchanged so the log keeps the
/// command-level detail.
#[derive(Debug, thiserror::Error)]
pub enum UiError {
    /// Required configuration is missing or unusable.
    #[error("config: {0}")]
    Config(String),

    /// The SPI bus rejected a transfer to the panel.
    #[error("display: {source}")]
    Display {
        /// Underlying bus error.
        #[source]
        source: std::io::Error,
    },

    /// A GPIO line could not be claimed or read.
    #[error("gpio: {source}")]
    Gpio {
        /// Underlying sysfs error.
        #[source]
        source: linux_embedded_hal::sysfs_gpio::Error,
    },

    /// A storage operation failed underneath the menu.
    #[error(transparent)]
    Storage(#[from] valise_storage::StorageError),
}

impl UiError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<std::io::Error> for UiError {
    fn from(source: std::io::Error) -> Self {
        Self::Display { source }
    }
}

impl From<linux_embedded_hal::sysfs_gpio::Error> for UiError {
    fn from(source: linux_embedded_hal::sysfs_gpio::Error) -> Self {
        Self::Gpio { source }
    }
}
