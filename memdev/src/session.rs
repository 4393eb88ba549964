//! Per-connection cursor over a shared [`BoundedBuffer`]

use embedded_io::{ErrorType, SeekFrom};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::command::{Command, SeekMode};
use crate::error::{Access, DeviceError};
use crate::io::{BoundedBuffer, CopyIn, CopyOut};

/// One open connection to a buffer
///
/// A session owns its cursor and shares the storage with every other
/// session opened on the same buffer.
///
/// # Thread Safety
///
/// - **Storage access is serialized**: `read`, `write` and `clear` take the
///   buffer lock for the duration of the copy, so two sessions on different
///   threads never observe a half-done operation of each other. Overlapping
///   writes are last-writer-wins.
/// - **Cursor is session-local**: `seek` and `tell` never touch the buffer
///   lock. All cursor-moving methods take `&mut self`, which makes the
///   borrow checker serialize them for one session.
/// - **Independent sessions**: clearing the buffer rewinds only the session
///   that issued the command. Other sessions keep their cursors.
pub struct Session {
    buffer: Arc<BoundedBuffer>,
    cursor: usize,
}

impl Session {
    pub(crate) fn new(buffer: Arc<BoundedBuffer>) -> Self {
        debug!(capacity = buffer.capacity(), "session opened");
        Self { buffer, cursor: 0 }
    }

    /// Current cursor, always within `[0, capacity]`
    #[must_use]
    pub fn tell(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// The buffer this session is bound to
    #[must_use]
    pub fn buffer(&self) -> &Arc<BoundedBuffer> {
        &self.buffer
    }

    /// Read into `buf` from the cursor
    ///
    /// Returns the number of bytes read. It is less than `buf.len()` at the
    /// tail of the region and 0 once the cursor is at the capacity.
    ///
    /// # Errors
    ///
    /// See [`Session::read_into`].
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        self.read_into(buf)
    }

    /// Read into an arbitrary caller region from the cursor
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::CopyFault`] if the region rejects the copy. The
    /// cursor does not move in that case.
    pub fn read_into<R>(&mut self, out: &mut R) -> Result<usize, DeviceError>
    where
        R: CopyOut + ?Sized,
    {
        let n = self.buffer.read_at(self.cursor, out)?;
        self.cursor += n;
        Ok(n)
    }

    /// Write `data` at the cursor
    ///
    /// Returns the number of bytes written, which is less than `data.len()`
    /// when the write reaches the capacity.
    ///
    /// # Errors
    ///
    /// See [`Session::write_from`].
    pub fn write(&mut self, data: &[u8]) -> Result<usize, DeviceError> {
        self.write_from(data)
    }

    /// Write from an arbitrary caller region at the cursor
    ///
    /// # Errors
    ///
    /// - [`DeviceError::OutOfRange`] if the cursor is at the capacity and
    ///   the region is not empty.
    /// - [`DeviceError::CopyFault`] if the region rejects the copy.
    ///
    /// The cursor does not move on error.
    pub fn write_from<W>(&mut self, input: &W) -> Result<usize, DeviceError>
    where
        W: CopyIn + ?Sized,
    {
        let n = self.buffer.write_at(self.cursor, input)?;
        self.cursor += n;
        Ok(n)
    }

    /// Move the cursor
    ///
    /// Returns the new cursor.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::OutOfRange`] if the target is outside
    /// `[0, capacity]`. The cursor is left unchanged.
    pub fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<usize, DeviceError> {
        let base = match mode {
            SeekMode::Absolute => 0,
            SeekMode::Relative => self.cursor as i128,
        };
        let target = base + i128::from(offset);
        let capacity = self.buffer.capacity();

        let cursor = usize::try_from(target)
            .ok()
            .filter(|pos| *pos <= capacity)
            .ok_or(DeviceError::OutOfRange {
                op: Access::Seek,
                offset: target,
                capacity,
            })?;

        trace!(?mode, offset, cursor, "seek");
        self.cursor = cursor;
        Ok(cursor)
    }

    /// Zero the whole buffer and rewind this session
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Run a control command
    pub fn control(&mut self, command: Command) {
        match command {
            Command::Clear => self.clear(),
        }
    }

    /// Run a control command given by its raw code
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnsupportedCommand`] for any code other than
    /// [`crate::command::MEM_CLEAR`]. Nothing is changed in that case.
    pub fn ioctl(&mut self, code: u32) -> Result<(), DeviceError> {
        let command = Command::try_from(code)?;
        self.control(command);
        Ok(())
    }

    /// Close the session
    ///
    /// Equivalent to dropping it. The buffer and other sessions are not
    /// affected.
    pub fn close(self) {}

    fn seek_from(&mut self, pos: SeekFrom) -> Result<u64, DeviceError> {
        let cursor = match pos {
            SeekFrom::Start(offset) => {
                let offset = i64::try_from(offset).map_err(|_| DeviceError::OutOfRange {
                    op: Access::Seek,
                    offset: i128::from(offset),
                    capacity: self.capacity(),
                })?;
                self.seek(offset, SeekMode::Absolute)?
            }
            SeekFrom::Current(offset) => self.seek(offset, SeekMode::Relative)?,
            SeekFrom::End(_) => return Err(DeviceError::UnsupportedSeek(2)),
        };
        Ok(cursor as u64)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session(cursor={}, capacity={})",
            self.cursor,
            self.buffer.capacity()
        )
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(cursor = self.cursor, "session closed");
    }
}

// Implement embedded_io traits
impl ErrorType for Session {
    type Error = DeviceError;
}

impl embedded_io::Read for Session {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Session::read(self, buf)
    }
}

impl embedded_io::Write for Session {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Session::write(self, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Seek for Session {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        self.seek_from(pos)
    }
}

impl embedded_io_async::Read for Session {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Session::read(self, buf)
    }
}

impl embedded_io_async::Write for Session {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Session::write(self, buf)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io_async::Seek for Session {
    async fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        self.seek_from(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(capacity: usize) -> Session {
        BoundedBuffer::new(capacity).unwrap().into_shared().open()
    }

    #[test]
    fn test_open_starts_at_zero() {
        let s = session(8);
        assert_eq!(s.tell(), 0);
        assert_eq!(s.capacity(), 8);
    }

    #[test]
    fn test_relative_seek_is_checked() {
        let mut s = session(8);
        assert_eq!(s.seek(5, SeekMode::Absolute).unwrap(), 5);
        assert_eq!(s.seek(-5, SeekMode::Relative).unwrap(), 0);
        assert!(s.seek(-1, SeekMode::Relative).is_err());
        assert!(s.seek(i64::MAX, SeekMode::Relative).is_err());
        assert_eq!(s.tell(), 0);
    }

    #[test]
    fn test_seek_from_end_unsupported() {
        let mut s = session(8);
        assert_eq!(
            s.seek_from(SeekFrom::End(0)),
            Err(DeviceError::UnsupportedSeek(2))
        );
        assert_eq!(
            s.seek_from(SeekFrom::Start(u64::MAX)),
            Err(DeviceError::OutOfRange {
                op: Access::Seek,
                offset: i128::from(u64::MAX),
                capacity: 8
            })
        );
    }

    #[test]
    fn test_debug_format() {
        let s = session(8);
        assert_eq!(format!("{s:?}"), "Session(cursor=0, capacity=8)");
    }
}
