//! A padded-bump allocator: grows the arena in batches of at least
//! `MIN_ALLOC` bytes and bumps within the resulting pad, amortizing arena
//! calls the way [`super::bump::BumpAllocator`] does not. `free` is a
//! no-op, same as the plain bump allocator.

use core::ptr::NonNull;

use crate::arena::ArenaProvider;
use crate::UNIT_SIZE;

/// Minimum bytes requested per arena growth; mirrors the reference
/// implementation's `MIN_ALLOC` batching constant.
pub const MIN_ALLOC: usize = 8192;

#[inline]
fn round_up(bytes: usize) -> usize {
    ((bytes + UNIT_SIZE - 1) / UNIT_SIZE) * UNIT_SIZE
}

/// A padded-bump allocator over an [`ArenaProvider`].
pub struct PaddedBumpAllocator<A: ArenaProvider> {
    brk: Option<NonNull<u8>>,
    pad: Option<NonNull<u8>>,
    arena: A,
}

impl<A: ArenaProvider> PaddedBumpAllocator<A> {
    pub const fn new(arena: A) -> Self {
        Self { brk: None, pad: None, arena }
    }

    pub fn malloc(&mut self, bytes: usize) -> Option<NonNull<u8>> {
        if bytes == 0 {
            return None;
        }

        let rounded = round_up(bytes);

        if self.brk.is_none() {
            let base = self.arena.current_base()?;
            self.brk = Some(base);
            self.pad = Some(base);
        }

        let brk = self.brk.unwrap();
        let pad = self.pad.unwrap();

        if (pad.as_ptr() as usize) + rounded > brk.as_ptr() as usize {
            let grow_to = (pad.as_ptr() as usize + rounded).max(brk.as_ptr() as usize + MIN_ALLOC);
            let grow_bytes = grow_to.checked_sub(brk.as_ptr() as usize)?;

            unsafe { self.arena.extend(grow_bytes).ok()? };
            self.brk = Some(unsafe { NonNull::new_unchecked(grow_to as *mut u8) });
        }

        let result = self.pad.unwrap();
        self.pad = Some(unsafe { NonNull::new_unchecked((result.as_ptr() as usize + rounded) as *mut u8) });
        Some(result)
    }

    /// No-op, matching the reference padded-bump allocator.
    pub fn free(&mut self, _payload: Option<NonNull<u8>>) {}
}
