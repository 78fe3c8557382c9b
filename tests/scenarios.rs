//! End-to-end scenarios for the allocator engine, driven against a
//! deterministic `SliceArena` rather than the real OS break, so that these
//! tests are reproducible without a real process heap.

use freelist_heap::arena::SliceArena;
use freelist_heap::{Chunk, FreeListHeap, UNIT_SIZE};

fn heap_of(bytes: usize) -> (FreeListHeap<SliceArena>, Box<[u8]>) {
    let mut backing = vec![0u8; bytes].into_boxed_slice();
    let arena = unsafe { SliceArena::new(&mut backing) };
    (FreeListHeap::new(arena), backing)
}

#[test]
fn scenario_1_fresh_alloc_grows_heap_and_validates() {
    let (mut heap, _backing) = heap_of(1 << 16);

    let p1 = heap.malloc(UNIT_SIZE).unwrap();
    assert!(heap.is_valid());

    let start = heap.heap_start().unwrap();
    let end = heap.heap_end().unwrap();
    assert_eq!(unsafe { Chunk::from_payload(p1) }.as_ptr(), start);
    assert!(end != start);
}

#[test]
fn scenario_2_two_allocs_then_frees_merge_into_one_chunk() {
    let (mut heap, _backing) = heap_of(1 << 16);

    let p1 = heap.malloc(UNIT_SIZE).unwrap();
    let p2 = heap.malloc(UNIT_SIZE).unwrap();
    unsafe {
        heap.free(Some(p1));
        heap.free(Some(p2));
    }
    assert!(heap.is_valid());

    let start = heap.heap_start().unwrap();
    let end = heap.heap_end().unwrap();
    let only = unsafe { Chunk::from_base(start) };
    assert!(only.is_free());
    assert!(only.next_in_mem(end).is_none());
}

#[test]
fn scenario_3_exact_size_refit_reuses_same_chunk() {
    let (mut heap, _backing) = heap_of(1 << 16);

    let p = heap.malloc(2 * UNIT_SIZE).unwrap();
    unsafe { heap.free(Some(p)) };
    let q = heap.malloc(2 * UNIT_SIZE).unwrap();

    assert_eq!(p, q);
}

/// Walks every chunk from `heap_start` to `heap_end`, returning
/// `(used_units, free_units)`.
fn walk_unit_totals(heap: &FreeListHeap<SliceArena>) -> (usize, usize) {
    let start = heap.heap_start().unwrap();
    let end = heap.heap_end().unwrap();

    let mut used_units = 0usize;
    let mut free_units = 0usize;
    let mut cur = unsafe { Chunk::from_base(start) };
    loop {
        if cur.is_free() {
            free_units += cur.units();
        } else {
            used_units += cur.units();
        }
        match cur.next_in_mem(end) {
            Some(next) => cur = next,
            None => break,
        }
    }
    (used_units, free_units)
}

#[test]
fn scenario_4_alternating_sizes_keep_heap_valid_throughout() {
    let (mut heap, _backing) = heap_of(1 << 20);

    for i in 0..100 {
        let bytes = if i % 2 == 0 { UNIT_SIZE } else { 3 * UNIT_SIZE };
        assert!(heap.malloc(bytes).is_some());
        assert!(heap.is_valid());
    }

    let heap_units =
        (heap.heap_end().unwrap().as_ptr() as usize - heap.heap_start().unwrap().as_ptr() as usize)
            / UNIT_SIZE;
    let (used_units, free_units) = walk_unit_totals(&heap);

    // Spec §8: total free-chunk unit count equals heap_units - Σ used_units.
    assert_eq!(used_units + free_units, heap_units);
    assert_eq!(free_units, heap_units - used_units);
}

#[test]
fn scenario_5_sequential_frees_bridge_coalesce_through_middle_chunk() {
    let (mut heap, _backing) = heap_of(1 << 16);

    let a = heap.malloc(UNIT_SIZE).unwrap();
    let b = heap.malloc(UNIT_SIZE).unwrap();
    let c = heap.malloc(UNIT_SIZE).unwrap();
    unsafe {
        heap.free(Some(a));
        heap.free(Some(c));
        heap.free(Some(b));
    }
    assert!(heap.is_valid());

    let start = heap.heap_start().unwrap();
    let end = heap.heap_end().unwrap();
    let only = unsafe { Chunk::from_base(start) };
    assert!(only.is_free());
    assert!(only.next_in_mem(end).is_none());
}

#[test]
fn scenario_6_exhausted_arena_returns_null_and_stays_valid() {
    let (mut heap, _backing) = heap_of(64);

    assert!(heap.is_valid());
    assert!(heap.malloc(1 << 30).is_none());
    assert!(heap.is_valid());
}
