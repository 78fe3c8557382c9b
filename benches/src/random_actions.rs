//! Drives the three allocators in this repository (the explicit free-list
//! engine, and the two baseline reference allocators) through random
//! allocate/free sequences and reports throughput. Not part of the
//! library's test suite.

use std::ptr::NonNull;
use std::time::{Duration, Instant};

use freelist_heap::arena::SliceArena;
use freelist_heap::baseline::{BumpAllocator, PaddedBumpAllocator};
use freelist_heap::FreeListHeap;

trait Bencher {
    fn malloc(&mut self, bytes: usize) -> Option<NonNull<u8>>;
    fn free(&mut self, payload: Option<NonNull<u8>>);
}

impl Bencher for FreeListHeap<SliceArena> {
    fn malloc(&mut self, bytes: usize) -> Option<NonNull<u8>> {
        FreeListHeap::malloc(self, bytes)
    }

    fn free(&mut self, payload: Option<NonNull<u8>>) {
        unsafe { FreeListHeap::free(self, payload) }
    }
}

impl Bencher for BumpAllocator<SliceArena> {
    fn malloc(&mut self, bytes: usize) -> Option<NonNull<u8>> {
        BumpAllocator::malloc(self, bytes)
    }

    fn free(&mut self, payload: Option<NonNull<u8>>) {
        BumpAllocator::free(self, payload)
    }
}

impl Bencher for PaddedBumpAllocator<SliceArena> {
    fn malloc(&mut self, bytes: usize) -> Option<NonNull<u8>> {
        PaddedBumpAllocator::malloc(self, bytes)
    }

    fn free(&mut self, payload: Option<NonNull<u8>>) {
        PaddedBumpAllocator::free(self, payload)
    }
}

const HEAP_SIZE: usize = 1 << 26;
const DURATION: Duration = Duration::from_millis(500);
const TARGET_MIN_ALLOCATIONS: usize = 300;

fn main() {
    let mut iterations = None;
    let mut max_size = 10_000usize;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--iterations" => {
                iterations = args
                    .next()
                    .and_then(|a| a.parse::<usize>().ok())
                    .or(iterations)
            }
            "--max-size" => {
                max_size = args
                    .next()
                    .and_then(|a| a.parse::<usize>().ok())
                    .unwrap_or(max_size)
            }
            "--name" => {
                // accepted but unused; this bench always writes to stdout.
                args.next();
            }
            "--help" => {
                println!(
                    "random_actions benchmark\n\n\
                     Usage: cargo run -p benches --bin random_actions --release\n\n\
                     Options:\n  \
                     --iterations  Number of random actions per allocator [default: time-boxed].\n  \
                     --max-size    Maximum allocation size in bytes [default = 10000]."
                );
                return;
            }
            other => panic!("unrecognized argument '{other}'"),
        }
    }

    let mut backing_a = vec![0u8; HEAP_SIZE];
    let mut backing_b = vec![0u8; HEAP_SIZE];
    let mut backing_c = vec![0u8; HEAP_SIZE];

    let free_list: Box<dyn Bencher> =
        Box::new(FreeListHeap::new(unsafe { SliceArena::new(&mut backing_a) }));
    let bump: Box<dyn Bencher> =
        Box::new(BumpAllocator::new(unsafe { SliceArena::new(&mut backing_b) }));
    let padded_bump: Box<dyn Bencher> =
        Box::new(PaddedBumpAllocator::new(unsafe { SliceArena::new(&mut backing_c) }));

    for (name, mut allocator) in [
        ("explicit free-list", free_list),
        ("bump", bump),
        ("padded bump", padded_bump),
    ] {
        let score = random_actions(allocator.as_mut(), max_size, iterations);
        println!("{name:>18}: {score} successful actions");
    }
}

fn random_actions(allocator: &mut dyn Bencher, max_size: usize, iterations: Option<usize>) -> usize {
    let rng = fastrand::Rng::new();
    let mut live = Vec::with_capacity(4096);
    let mut score = 0usize;

    let mut run_one = || {
        let action = rng.usize(0..=3);
        if action == 0 && live.len() >= TARGET_MIN_ALLOCATIONS {
            let index = rng.usize(0..live.len());
            let payload: NonNull<u8> = live.swap_remove(index);
            allocator.free(Some(payload));
        } else {
            let size = rng.usize(1..max_size.max(2));
            if let Some(p) = allocator.malloc(size) {
                live.push(p);
            }
        }
        score += 1;
    };

    match iterations {
        Some(n) => {
            for _ in 0..n {
                run_one();
            }
        }
        None => {
            let start = Instant::now();
            while start.elapsed() < DURATION {
                for _ in 0..256 {
                    run_one();
                }
            }
        }
    }

    score
}
