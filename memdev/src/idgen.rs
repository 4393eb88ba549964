//! Session handles issued by the device host

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Opaque id of an open session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    id: i64,
}

impl Handle {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self { id }
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// Thread-safe ID generator
#[derive(Debug)]
pub struct IdGen {
    next_id: AtomicI64,
}

impl IdGen {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
        }
    }

    /// Get the next unique handle
    pub fn next_handle(&self) -> Handle {
        Handle::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_sequential_from_one() {
        let id_gen = IdGen::new();
        assert_eq!(id_gen.next_handle(), Handle::new(1));
        assert_eq!(id_gen.next_handle(), Handle::new(2));
        assert_eq!(id_gen.next_handle().id(), 3);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(Handle::new(7).to_string(), "#7");
    }
}
