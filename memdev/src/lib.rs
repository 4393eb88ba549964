pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod idgen;
pub mod io;
pub mod session;

// Re-export buffer types for convenience
pub use io::{BoundedBuffer, CopyIn, CopyOut, StorageGuard};

// Re-export session and command types
pub use command::{Command, SeekMode, MEM_CLEAR, SEEK_CUR, SEEK_SET};
pub use session::Session;

// Re-export host layer
pub use config::DeviceConfig;
pub use device::MemDevice;
pub use idgen::{Handle, IdGen};

// Re-export error types
pub use error::{Access, ConfigError, CopyFault, DeviceError};
