//! The segregated free-list index ("bins"): one doubly-linked list head per
//! chunk-size class in units, plus a terminal overflow bin for anything
//! larger than `BIN_MAX - 1` units.

use crate::chunk::Chunk;

/// Number of bins; the last is the overflow bin.
pub const BIN_MAX: usize = 1024;

#[derive(Clone, Copy)]
pub struct Bins {
    heads: [Option<Chunk>; BIN_MAX],
}

impl Bins {
    pub const fn new() -> Self {
        Self { heads: [None; BIN_MAX] }
    }

    #[inline]
    fn index_for(units: usize) -> usize {
        if units > BIN_MAX - 1 {
            BIN_MAX - 1
        } else {
            units
        }
    }

    /// Splices `c` at the head of the bin for its current `units`.
    ///
    /// # Safety
    /// `c` must not already be linked into any bin.
    pub unsafe fn insert_front(&mut self, c: Chunk) {
        let idx = Self::index_for(c.units());
        let old_head = self.heads[idx];

        c.set_prev_in_list(None);
        c.set_next_in_list(old_head);
        if let Some(head) = old_head {
            head.set_prev_in_list(Some(c));
        }
        self.heads[idx] = Some(c);
    }

    /// Unlinks `c` from the bin matching its current `units`.
    ///
    /// # Safety
    /// `c` must currently be linked into that bin.
    pub unsafe fn remove(&mut self, c: Chunk) {
        let idx = Self::index_for(c.units());
        let prev = c.prev_in_list();
        let next = c.next_in_list();

        match prev {
            Some(p) => p.set_next_in_list(next),
            None => self.heads[idx] = next,
        }
        if let Some(n) = next {
            n.set_prev_in_list(prev);
        }
    }

    /// Scans from `bins[min(u, BIN_MAX-1)]` upward for the first chunk
    /// whose `units >= u`. Bounded by `BIN_MAX` iterations of the outer
    /// scan; each bin's own scan is unbounded (bins are size-indexed but
    /// not strictly sorted).
    pub fn find_fit(&self, units: usize) -> Option<Chunk> {
        let start = Self::index_for(units);
        for idx in start..BIN_MAX {
            let mut cur = self.heads[idx];
            while let Some(c) = cur {
                if c.units() >= units {
                    return Some(c);
                }
                cur = c.next_in_list();
            }
        }
        None
    }

    #[inline]
    pub fn head(&self, idx: usize) -> Option<Chunk> {
        self.heads[idx]
    }

    pub fn iter_bin(&self, idx: usize) -> BinIter {
        BinIter(self.heads[idx])
    }
}

impl Default for Bins {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterates a single bin's chunks front to back.
pub struct BinIter(Option<Chunk>);

impl Iterator for BinIter {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let c = self.0?;
        self.0 = c.next_in_list();
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UNIT_SIZE;
    use core::ptr::NonNull;

    unsafe fn region(units: usize) -> NonNull<u8> {
        let layout = core::alloc::Layout::from_size_align(units * UNIT_SIZE, UNIT_SIZE).unwrap();
        NonNull::new(std::alloc::alloc(layout)).unwrap()
    }

    #[test]
    fn insert_then_find_then_remove() {
        unsafe {
            let mut bins = Bins::new();
            let base = region(5);
            let c = Chunk::new_free(base, 5);

            bins.insert_front(c);
            assert_eq!(bins.head(5), Some(c));
            assert_eq!(bins.find_fit(3), Some(c));
            assert_eq!(bins.find_fit(6), None);

            bins.remove(c);
            assert_eq!(bins.head(5), None);
            assert_eq!(bins.find_fit(3), None);

            std::alloc::dealloc(
                base.as_ptr(),
                core::alloc::Layout::from_size_align(5 * UNIT_SIZE, UNIT_SIZE).unwrap(),
            );
        }
    }

    #[test]
    fn oversize_chunks_land_in_overflow_bin() {
        unsafe {
            let mut bins = Bins::new();
            let base = region(BIN_MAX + 50);
            let c = Chunk::new_free(base, BIN_MAX + 50);

            bins.insert_front(c);
            assert_eq!(bins.head(BIN_MAX - 1), Some(c));
            assert!(bins.head(BIN_MAX - 2).is_none());

            std::alloc::dealloc(
                base.as_ptr(),
                core::alloc::Layout::from_size_align((BIN_MAX + 50) * UNIT_SIZE, UNIT_SIZE)
                    .unwrap(),
            );
        }
    }

    #[test]
    fn head_prev_is_always_null() {
        unsafe {
            let mut bins = Bins::new();
            let b1 = region(4);
            let b2 = region(4);
            let c1 = Chunk::new_free(b1, 4);
            let c2 = Chunk::new_free(b2, 4);

            bins.insert_front(c1);
            bins.insert_front(c2);
            assert_eq!(bins.head(4), Some(c2));
            assert!(c2.prev_in_list().is_none());
            assert_eq!(c2.next_in_list(), Some(c1));
            assert_eq!(c1.prev_in_list(), Some(c2));

            let layout = core::alloc::Layout::from_size_align(4 * UNIT_SIZE, UNIT_SIZE).unwrap();
            std::alloc::dealloc(b1.as_ptr(), layout);
            std::alloc::dealloc(b2.as_ptr(), layout);
        }
    }
}
