//! [`Locked`], a mutex-wrapped [`FreeListHeap`] for use as a
//! `#[global_allocator]` or with the `allocator-api2` crate's stable
//! `Allocator` trait.
//!
//! This is an outer adapter only: the engine itself stays single-threaded
//! and unaware of locking (§5). `Locked` exists purely so hosts that want
//! the classic process-wide allocator experience can get one.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{null_mut, NonNull};

use crate::arena::ArenaProvider;
use crate::engine::FreeListHeap;
use crate::UNIT_SIZE;

#[cfg(feature = "allocator")]
use allocator_api2::alloc::{AllocError, Allocator};

/// A `lock_api`-backed mutex around a [`FreeListHeap`], implementing
/// [`GlobalAlloc`] and, under the `allocator` feature, `allocator-api2`'s
/// `Allocator`.
pub struct Locked<R: lock_api::RawMutex, A: ArenaProvider> {
    mutex: lock_api::Mutex<R, FreeListHeap<A>>,
}

impl<R: lock_api::RawMutex, A: ArenaProvider> Locked<R, A> {
    pub const fn new(heap: FreeListHeap<A>) -> Self {
        Self { mutex: lock_api::Mutex::new(heap) }
    }

    pub fn lock(&self) -> lock_api::MutexGuard<R, FreeListHeap<A>> {
        self.mutex.lock()
    }

    pub fn try_lock(&self) -> Option<lock_api::MutexGuard<R, FreeListHeap<A>>> {
        self.mutex.try_lock()
    }

    pub fn into_inner(self) -> FreeListHeap<A> {
        self.mutex.into_inner()
    }
}

/// The engine only hands out payloads aligned to [`crate::UNIT_SIZE`];
/// layouts asking for more than that cannot be satisfied and are refused.
fn layout_fits(layout: Layout) -> bool {
    layout.align() <= UNIT_SIZE
}

unsafe impl<R: lock_api::RawMutex, A: ArenaProvider> GlobalAlloc for Locked<R, A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if !layout_fits(layout) {
            return null_mut();
        }
        self.lock().malloc(layout.size()).map_or(null_mut(), |p| p.as_ptr())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        self.lock().free(NonNull::new(ptr));
    }

    unsafe fn realloc(&self, ptr: *mut u8, old_layout: Layout, new_size: usize) -> *mut u8 {
        // The engine never grows/shrinks a chunk in place; every resize is a
        // fresh allocation, a copy, and a free of the old chunk.
        let mut lock = self.lock();
        let Some(new_layout) = Layout::from_size_align(new_size, old_layout.align()).ok() else {
            return null_mut();
        };
        if !layout_fits(new_layout) {
            return null_mut();
        }

        let Some(new_ptr) = lock.malloc(new_size) else {
            return null_mut();
        };

        let copy_len = old_layout.size().min(new_size);
        core::ptr::copy_nonoverlapping(ptr, new_ptr.as_ptr(), copy_len);
        lock.free(NonNull::new(ptr));

        new_ptr.as_ptr()
    }
}

#[cfg(feature = "allocator")]
unsafe impl<R: lock_api::RawMutex, A: ArenaProvider> Allocator for Locked<R, A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            return Ok(NonNull::slice_from_raw_parts(NonNull::dangling(), 0));
        }
        if !layout_fits(layout) {
            return Err(AllocError);
        }

        self.lock()
            .malloc(layout.size())
            .map(|p| NonNull::slice_from_raw_parts(p, layout.size()))
            .ok_or(AllocError)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, _layout: Layout) {
        self.lock().free(Some(ptr));
    }

    unsafe fn grow(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<[u8]>, AllocError> {
        debug_assert!(new_layout.size() >= old_layout.size());
        if !layout_fits(new_layout) {
            return Err(AllocError);
        }

        let mut lock = self.lock();
        let new_ptr = lock.malloc(new_layout.size()).ok_or(AllocError)?;
        core::ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), old_layout.size());
        lock.free(Some(ptr));

        Ok(NonNull::slice_from_raw_parts(new_ptr, new_layout.size()))
    }

    unsafe fn shrink(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<[u8]>, AllocError> {
        debug_assert!(new_layout.size() <= old_layout.size());

        if new_layout.size() == 0 {
            self.lock().free(Some(ptr));
            return Ok(NonNull::slice_from_raw_parts(NonNull::dangling(), 0));
        }

        let mut lock = self.lock();
        let new_ptr = lock.malloc(new_layout.size()).ok_or(AllocError)?;
        core::ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), new_layout.size());
        lock.free(Some(ptr));

        Ok(NonNull::slice_from_raw_parts(new_ptr, new_layout.size()))
    }
}

impl<A: ArenaProvider> FreeListHeap<A> {
    /// Wraps this engine in a mutex, producing a [`Locked`] suitable for
    /// `#[global_allocator]`.
    pub const fn lock<R: lock_api::RawMutex>(self) -> Locked<R, A> {
        Locked::new(self)
    }
}
