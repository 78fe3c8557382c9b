//! The validator: checks every heap and bin invariant by construction, run
//! as a debug assertion at the entry and exit of `malloc` and `free`.

use core::ptr::NonNull;

use crate::bins::{Bins, BIN_MAX};
use crate::chunk::Status;

/// Names which invariant of §4.5 failed, and where, for use in test
/// failures and `debug_assert!` panic messages. Never part of the public
/// `malloc`/`free` contract (§7): user-visible failure stays `None`-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// (a) exactly one of `heap_start`/`heap_end` is set.
    HeapBoundsInconsistent,
    /// (b) the heap is empty but some bin is non-empty.
    NonEmptyBinOnEmptyHeap { bin: usize },
    /// (c) a chunk encountered in the forward memory walk fails
    /// `Chunk::is_valid`.
    InvalidChunk { at: *mut u8 },
    /// (d) two chunks that are adjacent in memory are both `Free`.
    AdjacentFreeChunks { first: *mut u8, second: *mut u8 },
    /// (e) a bin's linked list contains a cycle.
    BinCycle { bin: usize },
    /// (e) `prev.next != chunk` or `next.prev != chunk` for some pair.
    BinLinkageBroken { bin: usize },
    /// (e) a bin's head has a non-null `prev_in_list`.
    BinHeadHasPrev { bin: usize },
    /// (f) a chunk reachable from a bin is not `Free`.
    NonFreeChunkInBin { bin: usize, at: *mut u8 },
    /// (g) the number of free chunks found walking memory does not match
    /// the number reachable through the bins.
    FreeCountMismatch { walked: usize, binned: usize },
    /// (h) a chunk sits in the wrong bin for its `units`.
    WrongBinForUnits { bin: usize, units: usize },
}

// SAFETY: these raw pointers are only ever compared/printed for
// diagnostics, never dereferenced through `ValidationError`.
unsafe impl Send for ValidationError {}
unsafe impl Sync for ValidationError {}

/// Checks every invariant in §4.5 in order, short-circuiting on first
/// failure.
///
/// Item (c)'s "every `FREE` chunk seen is reachable from some bin" is
/// approximated by the count-equality check in (g) rather than an explicit
/// per-chunk membership test: the latter would require either an O(n·m)
/// scan or a dynamically-sized set, neither of which fits a `no_std`
/// validator that must run on every `malloc`/`free`. This mirrors the
/// original reference checker's own `memCount`/`listCount` comparison.
pub fn is_valid(
    heap_start: Option<NonNull<u8>>,
    heap_end: Option<NonNull<u8>>,
    bins: &Bins,
) -> Result<(), ValidationError> {
    let (heap_start, heap_end) = match (heap_start, heap_end) {
        (Some(s), Some(e)) => (s, e),
        (None, None) => return Ok(()), // never initialized: vacuously valid
        _ => return Err(ValidationError::HeapBoundsInconsistent),
    };

    if heap_start == heap_end {
        for bin in 0..BIN_MAX {
            if bins.head(bin).is_some() {
                return Err(ValidationError::NonEmptyBinOnEmptyHeap { bin });
            }
        }
        return Ok(());
    }

    // (c) + (d): forward walk
    let mut walked_free = 0usize;
    let mut cur = unsafe { crate::chunk::Chunk::from_base(heap_start) };
    let mut prev_was_free = false;
    loop {
        if !cur.is_valid(heap_start, heap_end) {
            return Err(ValidationError::InvalidChunk { at: cur.as_ptr().as_ptr() });
        }

        let is_free = cur.status() == Status::Free;
        if is_free {
            walked_free += 1;
            if prev_was_free {
                let prev = cur.prev_in_mem(heap_start).unwrap();
                return Err(ValidationError::AdjacentFreeChunks {
                    first: prev.as_ptr().as_ptr(),
                    second: cur.as_ptr().as_ptr(),
                });
            }
        }
        prev_was_free = is_free;

        match cur.next_in_mem(heap_end) {
            Some(next) => cur = next,
            None => break,
        }
    }
    // (e) + (f) + (h): every bin
    let mut binned_free = 0usize;
    for bin in 0..BIN_MAX {
        let Some(head) = bins.head(bin) else { continue };
        if head.prev_in_list().is_some() {
            return Err(ValidationError::BinHeadHasPrev { bin });
        }

        let mut tortoise = Some(head);
        let mut hare = Some(head);
        let mut count = 0usize;
        let mut node = Some(head);

        while let Some(c) = node {
            if c.status() != Status::Free {
                return Err(ValidationError::NonFreeChunkInBin { bin, at: c.as_ptr().as_ptr() });
            }

            let expected_bin = if bin == BIN_MAX - 1 {
                c.units() >= BIN_MAX - 1
            } else {
                c.units() == bin
            };
            if !expected_bin {
                return Err(ValidationError::WrongBinForUnits { bin, units: c.units() });
            }

            if let Some(next) = c.next_in_list() {
                if next.prev_in_list() != Some(c) {
                    return Err(ValidationError::BinLinkageBroken { bin });
                }
            }
            if let Some(prev) = c.prev_in_list() {
                if prev.next_in_list() != Some(c) {
                    return Err(ValidationError::BinLinkageBroken { bin });
                }
            }

            count += 1;
            node = c.next_in_list();

            // Floyd's tortoise-and-hare, advanced in lockstep with the scan.
            hare = hare.and_then(|h| h.next_in_list()).and_then(|h| h.next_in_list());
            tortoise = tortoise.and_then(|t| t.next_in_list());
            if let (Some(t), Some(h)) = (tortoise, hare) {
                if t == h && count > 1 {
                    return Err(ValidationError::BinCycle { bin });
                }
            }
        }

        binned_free += count;
    }

    if walked_free != binned_free {
        return Err(ValidationError::FreeCountMismatch { walked: walked_free, binned: binned_free });
    }

    Ok(())
}

/// Boolean form of [`is_valid`], discarding the specific failure reason.
pub fn is_valid_bool(heap_start: Option<NonNull<u8>>, heap_end: Option<NonNull<u8>>, bins: &Bins) -> bool {
    is_valid(heap_start, heap_end, bins).is_ok()
}
