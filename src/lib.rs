//! A general-purpose dynamic memory allocator built on explicit free lists
//! with in-band boundary-tag metadata.
//!
//! Requests are served from a single contiguous, monotonically growable
//! heap region. Free chunks are indexed by size into a fixed array of
//! segregated lists ("bins") for near-O(1) reuse, split when a fit is
//! oversize, and coalesced with free neighbors on both sides whenever a
//! chunk is released or the heap grows. See [`engine::FreeListHeap`] for
//! the core state machine and [`validator`] for the invariants it
//! maintains.
//!
//! ```
//! use freelist_heap::{FreeListHeap, arena::SliceArena};
//!
//! let mut backing = vec![0u8; 4096];
//! let arena = unsafe { SliceArena::new(&mut backing) };
//! let mut heap = FreeListHeap::new(arena);
//!
//! let p = heap.malloc(64).unwrap();
//! unsafe { heap.free(Some(p)) };
//! assert!(heap.is_valid());
//! ```

#![cfg_attr(not(test), no_std)]

#[cfg(any(test, feature = "std"))]
extern crate std;

/// The allocator's size quantum: large enough to hold a chunk header word
/// plus a free-list link word, sized to the platform's largest scalar
/// alignment.
pub const UNIT_SIZE: usize = 2 * core::mem::size_of::<usize>();

pub mod arena;
pub mod baseline;
pub mod bins;
pub mod chunk;
pub mod engine;
pub mod validator;

#[cfg(feature = "allocator")]
pub mod locked;

#[cfg(feature = "allocator")]
pub mod locking;

#[cfg(feature = "counters")]
pub mod counters;

pub use arena::{ArenaProvider, GrowError};
pub use bins::{Bins, BIN_MAX};
pub use chunk::{Chunk, Status, MIN_UNITS_PER_CHUNK};
pub use engine::{FreeListHeap, MIN_UNITS_FROM_OS};
pub use validator::ValidationError;

#[cfg(feature = "allocator")]
pub use locked::Locked;

