//! Baseline allocators retained only as reference points for the
//! `benches/` comparison harness; neither is used by [`crate::engine`].
//!
//! Both are grounded in the two simplest allocators from the original
//! reference material: a pure bump allocator that never reuses memory, and
//! a padded-bump allocator that over-requests from the arena to amortize
//! provider calls. Neither implements `free` beyond a no-op, matching their
//! reference sources exactly.

pub mod bump;
pub mod padded_bump;

pub use bump::BumpAllocator;
pub use padded_bump::PaddedBumpAllocator;
