//! Caller-supplied memory regions
//!
//! Reads copy *out* of the device into a [`CopyOut`] region, writes copy *in*
//! from a [`CopyIn`] region. Plain slices never fault; other implementations
//! (for example memory owned by another address space) may report
//! [`CopyFault`].

use crate::error::CopyFault;

/// Destination of a read
pub trait CopyOut {
    /// Number of bytes the caller asked for
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `src` into the start of the region.
    ///
    /// `src.len()` never exceeds `self.len()`.
    ///
    /// # Errors
    ///
    /// Returns [`CopyFault`] if the region is not writable.
    fn copy_out(&mut self, src: &[u8]) -> Result<(), CopyFault>;
}

/// Source of a write
pub trait CopyIn {
    /// Number of bytes the caller supplied
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`CopyIn::copy_in`] can fail
    ///
    /// Regions that cannot fault are copied straight into storage; all others
    /// are staged first so a failed copy never leaves a partial write.
    fn can_fault(&self) -> bool {
        true
    }

    /// Copy the start of the region into `dst`.
    ///
    /// `dst.len()` never exceeds `self.len()`.
    ///
    /// # Errors
    ///
    /// Returns [`CopyFault`] if the region is not readable.
    fn copy_in(&self, dst: &mut [u8]) -> Result<(), CopyFault>;
}

impl CopyOut for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_out(&mut self, src: &[u8]) -> Result<(), CopyFault> {
        self.get_mut(..src.len())
            .ok_or(CopyFault)?
            .copy_from_slice(src);
        Ok(())
    }
}

impl CopyIn for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn can_fault(&self) -> bool {
        false
    }

    fn copy_in(&self, dst: &mut [u8]) -> Result<(), CopyFault> {
        dst.copy_from_slice(self.get(..dst.len()).ok_or(CopyFault)?);
        Ok(())
    }
}
