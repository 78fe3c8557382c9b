//! Cumulative allocation statistics, feature-gated behind `counters`.
//!
//! Tracks the handful of cumulative figures that matter for comparing this
//! engine against the baseline allocators in `benches/`.

/// Cumulative counters tracked by a [`crate::FreeListHeap`] when the
/// `counters` feature is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    /// Number of active (not yet freed) allocations.
    pub allocation_count: usize,
    /// Total number of `malloc` calls that returned non-null.
    pub total_allocation_count: u64,

    /// Bytes requested by the caller, summed over active allocations.
    pub allocated_bytes: usize,
    /// Bytes requested by the caller, summed over every successful `malloc`.
    pub total_allocated_bytes: u64,

    /// Chunk bytes actually granted (including header/footer overhead),
    /// summed over active allocations.
    pub granted_bytes: usize,

    /// Number of times the engine called into the Arena Provider.
    pub grow_count: u64,
    /// Total bytes claimed from the Arena Provider.
    pub grown_bytes: u64,
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            allocation_count: 0,
            total_allocation_count: 0,
            allocated_bytes: 0,
            total_allocated_bytes: 0,
            granted_bytes: 0,
            grow_count: 0,
            grown_bytes: 0,
        }
    }

    /// Bytes granted but not actually requested: header/footer/split overhead.
    pub const fn overhead_bytes(&self) -> usize {
        self.granted_bytes - self.allocated_bytes
    }

    pub(crate) fn record_alloc(&mut self, requested_bytes: usize, granted_bytes: usize) {
        self.allocation_count += 1;
        self.total_allocation_count += 1;
        self.allocated_bytes += requested_bytes;
        self.total_allocated_bytes += requested_bytes as u64;
        self.granted_bytes += granted_bytes;
    }

    pub(crate) fn record_free(&mut self, granted_bytes: usize) {
        self.allocation_count -= 1;
        self.granted_bytes -= granted_bytes;
    }

    pub(crate) fn record_grow(&mut self, bytes: usize) {
        self.grow_count += 1;
        self.grown_bytes += bytes as u64;
    }
}
