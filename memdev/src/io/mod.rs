//! I/O module for memdev
//!
//! Contains the shared storage and the caller-region abstraction.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  MemDevice (host layer)             │
//! │  - session table keyed by Handle    │
//! │  - raw whence / ioctl translation   │
//! └─────────────────────────────────────┘
//!          │ open() / close()
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  Session (per connection)           │
//! │  - own cursor in [0, capacity]      │
//! │  - read/write/seek/clear            │
//! └─────────────────────────────────────┘
//!          │ Arc<BoundedBuffer>
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  BoundedBuffer (shared storage)     │
//! │  - Mutex<Box<[u8]>>, fixed length   │
//! │  - read_at() / write_at() / clear() │
//! └─────────────────────────────────────┘
//!          ▲
//!          │ copies through
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  CopyOut / CopyIn (caller regions)  │
//! └─────────────────────────────────────┘
//! ```

pub mod buffer;
pub mod region;

pub use buffer::{BoundedBuffer, StorageGuard};
pub use region::{CopyIn, CopyOut};
