//! The Arena Provider boundary (§4.2): the external collaborator that
//! supplies fresh, monotonically growing address-space to the engine.
//!
//! The engine is generic over [`ArenaProvider`] rather than hard-wired to
//! the OS heap break, so it can be driven deterministically in tests
//! (`SliceArena`) as well as against the real process break (`SbrkArena`).

use core::ptr::NonNull;

/// Why a call to [`ArenaProvider::extend`] failed. Both variants collapse to
/// the same `None` at the public `malloc` boundary (§7); this type exists so
/// tests and diagnostics can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowError {
    /// Advancing the heap end by the requested amount would overflow the
    /// address space.
    Overflow,
    /// The backing provider refused to extend (OS refusal, exhausted
    /// backing slice, etc).
    Refused,
}

/// The external collaborator that extends the heap. Implementations are
/// purely monotonic: they never shrink what they've already handed out.
pub trait ArenaProvider {
    /// Returns the current base address of the arena, establishing
    /// `heap_start == heap_end` on the engine's first call. Called at most
    /// once per `FreeListHeap` lifetime.
    fn current_base(&mut self) -> Option<NonNull<u8>>;

    /// Advances the arena by exactly `n_bytes`. On success, the byte range
    /// `[old_end, old_end + n_bytes)` becomes valid for reads and writes.
    ///
    /// # Safety
    /// The caller (the engine) guarantees `n_bytes` was computed from the
    /// provider's own `current_base` plus every prior successful `extend`,
    /// i.e. calls are never skipped or reordered relative to the engine's
    /// own bookkeeping of `heap_end`.
    unsafe fn extend(&mut self, n_bytes: usize) -> Result<(), GrowError>;
}

/// A deterministic arena backed by a caller-supplied, already-allocated
/// slice of memory. Used for `no_std`/embedded hosts and for test/bench
/// harnesses that want reproducible runs without touching the real OS
/// heap break.
pub struct SliceArena {
    base: NonNull<u8>,
    capacity: usize,
    committed: usize,
}

// SAFETY: SliceArena only manipulates an offset counter; the memory it
// hands out is owned exclusively by the single-threaded engine driving it.
unsafe impl Send for SliceArena {}

impl SliceArena {
    /// # Safety
    /// `slice` must remain valid and exclusively owned by this arena (and
    /// whatever `FreeListHeap` wraps it) for as long as it is in use.
    pub unsafe fn new(slice: &mut [u8]) -> Self {
        Self {
            base: NonNull::new_unchecked(slice.as_mut_ptr()),
            capacity: slice.len(),
            committed: 0,
        }
    }

    /// Bytes of the backing slice not yet committed to the heap.
    pub fn uncommitted_bytes(&self) -> usize {
        self.capacity - self.committed
    }
}

impl ArenaProvider for SliceArena {
    fn current_base(&mut self) -> Option<NonNull<u8>> {
        Some(self.base)
    }

    unsafe fn extend(&mut self, n_bytes: usize) -> Result<(), GrowError> {
        match self.committed.checked_add(n_bytes) {
            Some(new_committed) if new_committed <= self.capacity => {
                self.committed = new_committed;
                Ok(())
            }
            _ => Err(GrowError::Refused),
        }
    }
}

/// An arena backed by the process's real heap break, grown via `brk(2)`
/// (mirroring the original reference implementation's direct `sbrk`/`brk`
/// use). Available on Unix hosts with the `std` feature.
#[cfg(all(feature = "std", unix))]
pub struct SbrkArena {
    current_end: Option<NonNull<u8>>,
}

#[cfg(all(feature = "std", unix))]
unsafe impl Send for SbrkArena {}

#[cfg(all(feature = "std", unix))]
impl SbrkArena {
    pub const fn new() -> Self {
        Self { current_end: None }
    }
}

#[cfg(all(feature = "std", unix))]
impl Default for SbrkArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(feature = "std", unix))]
impl ArenaProvider for SbrkArena {
    fn current_base(&mut self) -> Option<NonNull<u8>> {
        if let Some(end) = self.current_end {
            return Some(end);
        }
        // SAFETY: sbrk(0) only queries the current break, it never moves it.
        let brk = unsafe { libc::sbrk(0) };
        if brk == usize::MAX as *mut libc::c_void {
            return None;
        }
        let ptr = NonNull::new(brk.cast::<u8>())?;
        self.current_end = Some(ptr);
        Some(ptr)
    }

    unsafe fn extend(&mut self, n_bytes: usize) -> Result<(), GrowError> {
        let current = self.current_base().ok_or(GrowError::Refused)?;
        let new_end = (current.as_ptr() as usize)
            .checked_add(n_bytes)
            .ok_or(GrowError::Overflow)?;

        if libc::brk(new_end as *mut libc::c_void) == -1 {
            return Err(GrowError::Refused);
        }

        self.current_end = Some(NonNull::new_unchecked(new_end as *mut u8));
        Ok(())
    }
}
