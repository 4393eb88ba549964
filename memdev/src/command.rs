//! Control commands and seek origins

use crate::error::DeviceError;

/// ioctl code that zeroes the whole device
pub const MEM_CLEAR: u32 = 0x1;

/// Raw whence: position from the start of the region
pub const SEEK_SET: i32 = 0;
/// Raw whence: position relative to the current cursor
pub const SEEK_CUR: i32 = 1;

/// Recognized out-of-band control commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Zero the storage and rewind the issuing session
    Clear,
}

impl Command {
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Clear => MEM_CLEAR,
        }
    }
}

impl TryFrom<u32> for Command {
    type Error = DeviceError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            MEM_CLEAR => Ok(Self::Clear),
            other => Err(DeviceError::UnsupportedCommand(other)),
        }
    }
}

/// Origin of a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    Absolute,
    Relative,
}

impl TryFrom<i32> for SeekMode {
    type Error = DeviceError;

    fn try_from(whence: i32) -> Result<Self, Self::Error> {
        match whence {
            SEEK_SET => Ok(Self::Absolute),
            SEEK_CUR => Ok(Self::Relative),
            other => Err(DeviceError::UnsupportedSeek(other)),
        }
    }
}
