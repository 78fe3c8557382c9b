//! A pure bump allocator: every `malloc` advances the break by exactly the
//! rounded-up request size; `free` is a no-op. Never reclaims.

use core::ptr::NonNull;

use crate::arena::ArenaProvider;
use crate::UNIT_SIZE;

/// Rounds `bytes` up to a multiple of [`UNIT_SIZE`], with no header or
/// footer overhead at all — the bump allocator hands out exactly the
/// rounded request, unlike [`crate::engine::FreeListHeap`].
#[inline]
fn round_up(bytes: usize) -> usize {
    ((bytes + UNIT_SIZE - 1) / UNIT_SIZE) * UNIT_SIZE
}

/// A bump allocator over an [`ArenaProvider`]. `free` never reclaims
/// anything; the arena only ever grows.
pub struct BumpAllocator<A: ArenaProvider> {
    brk: Option<NonNull<u8>>,
    arena: A,
}

impl<A: ArenaProvider> BumpAllocator<A> {
    pub const fn new(arena: A) -> Self {
        Self { brk: None, arena }
    }

    pub fn malloc(&mut self, bytes: usize) -> Option<NonNull<u8>> {
        if bytes == 0 {
            return None;
        }

        let rounded = round_up(bytes);
        let pc = match self.brk {
            Some(pc) => pc,
            None => self.arena.current_base()?,
        };

        let new_brk = (pc.as_ptr() as usize).checked_add(rounded)?;
        unsafe { self.arena.extend(rounded).ok()? };

        self.brk = Some(unsafe { NonNull::new_unchecked(new_brk as *mut u8) });
        Some(pc)
    }

    /// No-op, matching the reference bump allocator: memory is never
    /// reclaimed.
    pub fn free(&mut self, _payload: Option<NonNull<u8>>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::SliceArena;

    #[test]
    fn bump_never_reuses_freed_memory() {
        let mut backing = vec![0u8; 4096];
        let arena = unsafe { SliceArena::new(&mut backing) };
        let mut bump = BumpAllocator::new(arena);

        let a = bump.malloc(UNIT_SIZE).unwrap();
        bump.free(Some(a));
        let b = bump.malloc(UNIT_SIZE).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn malloc_zero_is_null() {
        let mut backing = vec![0u8; 4096];
        let arena = unsafe { SliceArena::new(&mut backing) };
        let mut bump = BumpAllocator::new(arena);
        assert!(bump.malloc(0).is_none());
    }
}
