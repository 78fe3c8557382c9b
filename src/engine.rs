//! The allocator engine (§4.4): the malloc/free state machine tying the
//! chunk layout, bin index, and arena provider together.

use core::ptr::NonNull;

use crate::arena::ArenaProvider;
use crate::bins::Bins;
use crate::chunk::{bytes_to_units, units_to_bytes, Chunk, Status, MIN_UNITS_PER_CHUNK};
use crate::validator::{self, ValidationError};

#[cfg(feature = "counters")]
use crate::counters::Counters;

/// Minimum units requested per arena growth, to amortize provider calls.
pub const MIN_UNITS_FROM_OS: usize = 512;

/// The free-chunk bookkeeping engine described in §4.4: `heap_start`,
/// `heap_end`, and the bins as fields of a single owned value rather than
/// process-globals (§9, "process-wide state, encapsulated").
pub struct FreeListHeap<A: ArenaProvider> {
    heap_start: Option<NonNull<u8>>,
    heap_end: Option<NonNull<u8>>,
    bins: Bins,
    arena: A,
    #[cfg(feature = "counters")]
    counters: Counters,
}

// SAFETY: a `FreeListHeap` is single-threaded per §5; `Send` only allows
// moving ownership to another thread, never concurrent access.
unsafe impl<A: ArenaProvider + Send> Send for FreeListHeap<A> {}

impl<A: ArenaProvider> core::fmt::Debug for FreeListHeap<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FreeListHeap")
            .field("heap_start", &self.heap_start)
            .field("heap_end", &self.heap_end)
            .finish_non_exhaustive()
    }
}

impl<A: ArenaProvider> FreeListHeap<A> {
    pub const fn new(arena: A) -> Self {
        Self {
            heap_start: None,
            heap_end: None,
            bins: Bins::new(),
            arena,
            #[cfg(feature = "counters")]
            counters: Counters::new(),
        }
    }

    #[inline]
    pub fn heap_start(&self) -> Option<NonNull<u8>> {
        self.heap_start
    }

    #[inline]
    pub fn heap_end(&self) -> Option<NonNull<u8>> {
        self.heap_end
    }

    #[cfg(feature = "counters")]
    #[inline]
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Checks every invariant of §4.5, returning a descriptive error.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validator::is_valid(self.heap_start, self.heap_end, &self.bins)
    }

    /// Boolean form of [`Self::validate`].
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    #[inline]
    fn debug_check(&self) {
        #[cfg(debug_assertions)]
        if let Err(e) = self.validate() {
            panic!("heap invariant violated: {:?}", e);
        }
    }

    /// §4.4.1: allocate at least `bytes` bytes, returning an aligned,
    /// uninitialized payload, or `None` if `bytes == 0` or the request
    /// cannot be satisfied.
    pub fn malloc(&mut self, bytes: usize) -> Option<NonNull<u8>> {
        if bytes == 0 {
            return None;
        }

        self.debug_check();

        if self.heap_start.is_none() {
            let base = self.arena.current_base()?;
            self.heap_start = Some(base);
            self.heap_end = Some(base);
        }

        let units = bytes_to_units(bytes);

        let chunk = match self.bins.find_fit(units) {
            Some(c) => self.use_chunk(c, units),
            None => {
                let c = self.grow(units)?;
                self.use_chunk(c, units)
            }
        };

        #[cfg(feature = "counters")]
        self.counters.record_alloc(bytes, units_to_bytes(chunk.units()));

        self.debug_check();
        Some(chunk.to_payload())
    }

    /// §4.4.2: release a previously allocated payload. `None` is a no-op.
    ///
    /// # Safety
    /// `payload`, if present, must be a value previously returned by
    /// `malloc` on this heap and not since freed.
    pub unsafe fn free(&mut self, payload: Option<NonNull<u8>>) {
        let Some(payload) = payload else { return };

        self.debug_check();

        let c = Chunk::from_payload(payload);
        #[cfg(feature = "counters")]
        let freed_bytes = units_to_bytes(c.units());
        c.set_status(Status::Free);

        // Redesign Flag (ii): coalesce first, insert into a bin exactly
        // once, rather than inserting then re-inserting after each merge.
        let c = self.merge_right(c);
        let c = self.merge_left(c);
        c.set_status(Status::Free);
        self.bins.insert_front(c);

        #[cfg(feature = "counters")]
        self.counters.record_free(freed_bytes);

        self.debug_check();
    }

    /// §4.4.3: obtain a new free chunk of at least `units` units by growing
    /// the arena, coalescing with the left neighbor if one is free.
    fn grow(&mut self, units: usize) -> Option<Chunk> {
        let request_units = units.max(MIN_UNITS_FROM_OS);
        let bytes = units_to_bytes(request_units);
        let heap_end = self.heap_end?;

        // Redesign Flag (iv): check for overflow and test the provider
        // before committing `heap_end`, not after.
        (heap_end.as_ptr() as usize).checked_add(bytes)?;

        // SAFETY: `bytes` is computed from `heap_end`, the engine's own
        // record of the provider's current extent.
        unsafe { self.arena.extend(bytes).ok()? };

        let new_end = unsafe { NonNull::new_unchecked(heap_end.as_ptr().add(bytes)) };
        let fresh = unsafe { Chunk::new_free(heap_end, request_units) };
        self.heap_end = Some(new_end);

        #[cfg(feature = "counters")]
        self.counters.record_grow(bytes);

        // Redesign Flag (i): coalesce with the left neighbor before the
        // chunk is ever inserted, instead of inserting then immediately
        // removing and re-inserting at a new size.
        let merged = self.merge_left(fresh);
        unsafe { self.bins.insert_front(merged) };
        Some(merged)
    }

    /// §4.4.5: consume `c` (already removed from its bin by the caller's
    /// `find_fit`/`grow`) for a request of `units`, splitting off a free
    /// tail if the remainder would itself be a valid chunk.
    fn use_chunk(&mut self, c: Chunk, units: usize) -> Chunk {
        unsafe { self.bins.remove(c) };

        if c.units() < units + MIN_UNITS_PER_CHUNK {
            c.set_status(Status::InUse);
            return c;
        }

        let remainder = c.units() - units;
        unsafe { c.resize(units) };
        c.set_status(Status::InUse);

        let tail = c.next_in_mem(self.heap_end.unwrap()).expect("split tail must exist");
        let tail = unsafe { Chunk::new_free(tail.as_ptr(), remainder) };
        unsafe { self.bins.insert_front(tail) };

        c
    }

    /// Merges `c` with its right neighbor if that neighbor is free.
    /// `c` must not currently be linked into any bin.
    fn merge_right(&mut self, c: Chunk) -> Chunk {
        if let Some(next) = c.next_in_mem(self.heap_end.unwrap()) {
            if next.status() == Status::Free {
                unsafe { self.bins.remove(next) };
                let merged_units = c.units() + next.units();
                unsafe { c.resize(merged_units) };
            }
        }
        c
    }

    /// Merges `c` with its left neighbor if that neighbor is free,
    /// returning the (possibly different-addressed) surviving chunk.
    /// `c` must not currently be linked into any bin.
    fn merge_left(&mut self, c: Chunk) -> Chunk {
        if let Some(prev) = c.prev_in_mem(self.heap_start.unwrap()) {
            if prev.status() == Status::Free {
                unsafe { self.bins.remove(prev) };
                let merged_units = prev.units() + c.units();
                unsafe { prev.resize(merged_units) };
                return prev;
            }
        }
        c
    }
}
