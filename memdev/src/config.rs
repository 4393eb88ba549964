//! Device configuration loaded from JSON

use serde::Deserialize;

use crate::error::ConfigError;

/// Capacity of the reference device
pub const DEFAULT_CAPACITY: usize = 4096;
pub const DEFAULT_NAME: &str = "simple_chr";

/// Settings a host uses to attach a device
///
/// Every field is optional in JSON; missing fields take the defaults of the
/// reference device.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Name the host registers the device under
    pub name: String,
    /// Fixed size of the storage in bytes
    pub capacity: usize,
    /// Requested major number, 0 lets the host pick one
    pub major: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            capacity: DEFAULT_CAPACITY,
            major: 0,
        }
    }
}

impl DeviceConfig {
    /// Creates a `DeviceConfig` by reading JSON from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - There are I/O errors reading from the provided reader
    /// - The JSON input is invalid or malformed
    /// - The resulting config does not pass [`DeviceConfig::validate`]
    pub fn from_reader(mut reader: impl embedded_io::Read) -> Result<Self, ConfigError> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match embedded_io::Read::read(&mut reader, &mut chunk) {
                Ok(0) => break,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                Err(e) => return Err(ConfigError::Read(format!("{e:?}"))),
            }
        }
        Self::from_slice(&buffer)
    }

    /// Parse and validate a JSON document
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON and
    /// [`ConfigError::InvalidCapacity`] if the capacity is zero.
    pub fn from_slice(json: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if the capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        Ok(())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}
