//! Fixed-capacity buffer with internal locking
//!
//! Provides the shared storage behind every session of a device.

use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{info, trace};

use super::region::{CopyIn, CopyOut};
use crate::error::{Access, DeviceError};
use crate::session::Session;

/// Read-only guard to buffer contents
///
/// Holds the lock and provides read-only access to the whole region.
/// The lock is released when the guard is dropped.
pub struct StorageGuard<'a>(MutexGuard<'a, Box<[u8]>>);

impl Deref for StorageGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for StorageGuard<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Fixed-capacity byte store with a single lock
///
/// The storage is allocated zero-filled at construction and never changes
/// length. Every read, write and clear runs under one `parking_lot::Mutex`
/// covering the whole region, so each of them is atomic with respect to the
/// others. Cursors are not stored here; see [`Session`].
///
/// # Example
///
/// ```
/// use memdev::BoundedBuffer;
///
/// let buffer = BoundedBuffer::new(8).unwrap().into_shared();
/// let mut session = buffer.open();
/// assert_eq!(session.write(b"ABCD").unwrap(), 4);
///
/// let guard = buffer.lock();
/// assert_eq!(&guard[..], b"ABCD\0\0\0\0");
/// ```
pub struct BoundedBuffer {
    capacity: usize,
    storage: Mutex<Box<[u8]>>,
}

impl BoundedBuffer {
    /// Create a zero-filled buffer of `capacity` bytes
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, DeviceError> {
        if capacity == 0 {
            return Err(DeviceError::InvalidCapacity);
        }
        Ok(Self {
            capacity,
            storage: Mutex::new(vec![0u8; capacity].into_boxed_slice()),
        })
    }

    /// Wrap the buffer so sessions can share it
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Open a new session positioned at offset 0
    #[must_use]
    pub fn open(self: &Arc<Self>) -> Session {
        Session::new(Arc::clone(self))
    }

    /// Lock the buffer for inspection
    ///
    /// Readers, writers and clears of every session wait until the guard
    /// is dropped.
    #[must_use]
    pub fn lock(&self) -> StorageGuard<'_> {
        StorageGuard(self.storage.lock())
    }

    /// Copy up to `out.len()` bytes starting at `pos` into `out`
    ///
    /// Returns the number of bytes copied. At or past the end of the region
    /// nothing is copied and `Ok(0)` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::CopyFault`] if `out` rejects the copy.
    pub fn read_at<R>(&self, pos: usize, out: &mut R) -> Result<usize, DeviceError>
    where
        R: CopyOut + ?Sized,
    {
        let count = out.len().min(self.capacity.saturating_sub(pos));
        if count == 0 {
            return Ok(0);
        }

        let storage = self.storage.lock();
        let src = storage
            .get(pos..pos + count)
            .ok_or_else(|| self.out_of_range(pos))?;
        out.copy_out(src)?;
        drop(storage);

        trace!(count, pos, "read from buffer");
        Ok(count)
    }

    /// Copy up to `input.len()` bytes from `input` into the region at `pos`
    ///
    /// Returns the number of bytes stored, which is less than `input.len()`
    /// when the write is truncated by the capacity. An empty input is a
    /// no-op returning `Ok(0)`.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::OutOfRange`] if `pos` is at or past the capacity and
    ///   `input` is not empty.
    /// - [`DeviceError::CopyFault`] if `input` rejects the copy. The storage
    ///   is left untouched in that case.
    pub fn write_at<W>(&self, pos: usize, input: &W) -> Result<usize, DeviceError>
    where
        W: CopyIn + ?Sized,
    {
        if input.is_empty() {
            return Ok(0);
        }
        if pos >= self.capacity {
            return Err(self.out_of_range(pos));
        }
        let count = input.len().min(self.capacity - pos);

        if input.can_fault() {
            // Stage outside the lock: a faulting source must not leave a partial write
            let mut staged = vec![0u8; count];
            input.copy_in(&mut staged)?;
            self.store(pos, count, &staged[..])?;
        } else {
            self.store(pos, count, input)?;
        }

        trace!(count, pos, "written to buffer");
        Ok(count)
    }

    /// Overwrite the whole region with zeros
    pub fn clear(&self) {
        self.storage.lock().fill(0);
        info!(capacity = self.capacity, "buffer is set to zero");
    }

    fn store<W>(&self, pos: usize, count: usize, input: &W) -> Result<(), DeviceError>
    where
        W: CopyIn + ?Sized,
    {
        let mut storage = self.storage.lock();
        let dst = storage
            .get_mut(pos..pos + count)
            .ok_or_else(|| self.out_of_range(pos))?;
        input.copy_in(dst)?;
        Ok(())
    }

    fn out_of_range(&self, pos: usize) -> DeviceError {
        DeviceError::OutOfRange {
            op: Access::Write,
            offset: pos as i128,
            capacity: self.capacity,
        }
    }
}

impl fmt::Debug for BoundedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundedBuffer(capacity={})", self.capacity)
    }
}
