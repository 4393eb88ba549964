//! Host-facing device with a session table
//!
//! `MemDevice` is what a host attaches: it owns one [`BoundedBuffer`], hands
//! out [`Handle`]s on open and translates raw seek origins and control codes
//! into the typed session API.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::command::SeekMode;
use crate::config::DeviceConfig;
use crate::error::{ConfigError, DeviceError};
use crate::idgen::{Handle, IdGen};
use crate::io::BoundedBuffer;
use crate::session::Session;

type SessionSlot = Arc<Mutex<Session>>;

/// An attached in-memory device
///
/// The session table lock is held only to look a handle up. Storage access
/// happens afterwards under the buffer lock, so opening, closing or seeking
/// a session never waits for another session's read or write.
pub struct MemDevice {
    config: DeviceConfig,
    buffer: Arc<BoundedBuffer>,
    sessions: Mutex<HashMap<Handle, SessionSlot>>,
    id_gen: IdGen,
}

impl MemDevice {
    /// Create the device storage described by `config`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if the capacity is zero.
    pub fn attach(config: DeviceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let buffer = BoundedBuffer::new(config.capacity)
            .map_err(|_| ConfigError::InvalidCapacity)?
            .into_shared();

        info!(name = %config.name, capacity = config.capacity, major = config.major, "device attached");

        Ok(Self {
            config,
            buffer,
            sessions: Mutex::new(HashMap::new()),
            id_gen: IdGen::new(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// The shared storage
    #[must_use]
    pub fn buffer(&self) -> &Arc<BoundedBuffer> {
        &self.buffer
    }

    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Open a session and return its handle
    pub fn open(&self) -> Handle {
        let handle = self.id_gen.next_handle();
        let session = self.buffer.open();
        self.sessions
            .lock()
            .insert(handle, Arc::new(Mutex::new(session)));
        debug!(%handle, "device open");
        handle
    }

    /// Close a session
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnknownSession`] if the handle is not open.
    pub fn close(&self, handle: Handle) -> Result<(), DeviceError> {
        let slot = self
            .sessions
            .lock()
            .remove(&handle)
            .ok_or(DeviceError::UnknownSession(handle))?;
        debug!(%handle, "device close");
        drop(slot);
        Ok(())
    }

    /// # Errors
    ///
    /// [`DeviceError::UnknownSession`] or any error of [`Session::read`].
    pub fn read(&self, handle: Handle, buf: &mut [u8]) -> Result<usize, DeviceError> {
        self.with_session(handle, |session| session.read(buf))
    }

    /// # Errors
    ///
    /// [`DeviceError::UnknownSession`] or any error of [`Session::write`].
    pub fn write(&self, handle: Handle, data: &[u8]) -> Result<usize, DeviceError> {
        self.with_session(handle, |session| session.write(data))
    }

    /// Seek with a raw whence value (`SEEK_SET` or `SEEK_CUR`)
    ///
    /// # Errors
    ///
    /// - [`DeviceError::UnknownSession`] if the handle is not open
    /// - [`DeviceError::UnsupportedSeek`] for any other whence
    /// - [`DeviceError::OutOfRange`] if the target is outside the region
    ///   (errno EINVAL, unlike a write at capacity)
    pub fn llseek(&self, handle: Handle, offset: i64, whence: i32) -> Result<usize, DeviceError> {
        let mode = SeekMode::try_from(whence)?;
        self.with_session(handle, |session| session.seek(offset, mode))
    }

    /// Run a control command given by its raw code
    ///
    /// # Errors
    ///
    /// [`DeviceError::UnknownSession`] or [`DeviceError::UnsupportedCommand`].
    pub fn ioctl(&self, handle: Handle, code: u32) -> Result<(), DeviceError> {
        self.with_session(handle, |session| session.ioctl(code))
    }

    /// Tear the device down
    ///
    /// Sessions still open are dropped with it.
    pub fn detach(self) {
        let open = self.open_sessions();
        if open > 0 {
            log::warn!(
                "MemDevice::detach() called with {open} open session(s) on {}",
                self.config.name
            );
        }
        info!(name = %self.config.name, "device detached");
    }

    fn with_session<T>(
        &self,
        handle: Handle,
        f: impl FnOnce(&mut Session) -> Result<T, DeviceError>,
    ) -> Result<T, DeviceError> {
        let slot = self
            .sessions
            .lock()
            .get(&handle)
            .cloned()
            .ok_or(DeviceError::UnknownSession(handle))?;
        let mut session = slot.lock();
        f(&mut *session)
    }
}

impl std::fmt::Debug for MemDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MemDevice(name={}, capacity={}, sessions={})",
            self.config.name,
            self.buffer.capacity(),
            self.open_sessions()
        )
    }
}
