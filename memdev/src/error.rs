//! Error types for device operations
//!
//! Every failure of the buffer protocol is reported as a [`DeviceError`].
//! [`DeviceError::errno`] gives the value a host would put on its
//! invalid-argument/bad-address error surface.

use std::fmt;

use crate::idgen::Handle;

pub const EBADF: i32 = 9;
pub const ENXIO: i32 = 6;
pub const EFAULT: i32 = 14;
pub const EINVAL: i32 = 22;

/// The caller-supplied region could not be copied to or from
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("bad address in caller region")]
pub struct CopyFault;

/// Operation that ran into the edge of the region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Seek,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seek => write!(f, "seek to"),
            Self::Write => write!(f, "write at"),
        }
    }
}

/// Error type for buffer, session and device operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// Seek target or write position outside `[0, capacity]`
    #[error("{op} offset {offset} is out of range [0, {capacity}]")]
    OutOfRange {
        op: Access,
        offset: i128,
        capacity: usize,
    },

    #[error("unsupported control command {0:#x}")]
    UnsupportedCommand(u32),

    #[error("unsupported seek origin {0}")]
    UnsupportedSeek(i32),

    #[error("copy fault: {0}")]
    CopyFault(#[from] CopyFault),

    #[error("no open session with handle {0}")]
    UnknownSession(Handle),

    #[error("buffer capacity must be positive")]
    InvalidCapacity,
}

impl DeviceError {
    /// Positive errno value matching this error
    #[must_use]
    pub fn errno(&self) -> i32 {
        match self {
            Self::OutOfRange { op: Access::Write, .. } => ENXIO,
            Self::OutOfRange { op: Access::Seek, .. }
            | Self::UnsupportedCommand(_)
            | Self::UnsupportedSeek(_)
            | Self::InvalidCapacity => EINVAL,
            Self::CopyFault(_) => EFAULT,
            Self::UnknownSession(_) => EBADF,
        }
    }
}

impl embedded_io::Error for DeviceError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::OutOfRange { .. } | Self::InvalidCapacity => embedded_io::ErrorKind::InvalidInput,
            Self::UnsupportedCommand(_) | Self::UnsupportedSeek(_) => {
                embedded_io::ErrorKind::Unsupported
            }
            Self::UnknownSession(_) => embedded_io::ErrorKind::NotFound,
            Self::CopyFault(_) => embedded_io::ErrorKind::Other,
        }
    }
}

/// Errors that can occur while loading a [`crate::DeviceConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read device config: {0}")]
    Read(String),

    #[error("failed to parse device config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("device capacity must be positive")]
    InvalidCapacity,
}
