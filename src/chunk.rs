//! In-band chunk layout: header, free-list links, footer, and the address
//! arithmetic used to walk chunks forwards and backwards in memory.
//!
//! A chunk's base address always carries a header (`units`, `status`); its
//! last unit always carries a footer mirroring `units`, so that the chunk to
//! the left of any address can be located in O(1) regardless of whether it
//! is free or in use. When a chunk is `Free`, the unit immediately following
//! the header additionally carries `prev_in_list`/`next_in_list`, aliasing
//! the same bytes a user would otherwise see as payload once the chunk is
//! handed out.

use core::ptr::NonNull;

use crate::UNIT_SIZE;

/// Minimum chunk size in units: header (1) + free-list links (1) + footer (1).
pub const MIN_UNITS_PER_CHUNK: usize = 3;

/// A chunk's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Status {
    Free = 0,
    InUse = 1,
}

impl Status {
    #[inline]
    fn from_raw(raw: usize) -> Option<Status> {
        match raw {
            0 => Some(Status::Free),
            1 => Some(Status::InUse),
            _ => None,
        }
    }
}

/// A handle to a chunk's base address. Cheap to copy; all mutation happens
/// through raw reads/writes into the chunk's in-band metadata.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Chunk(NonNull<u8>);

impl core::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Chunk")
            .field("base", &self.0.as_ptr())
            .field("units", &self.units())
            .field("status", &self.raw_status())
            .finish()
    }
}

// word offsets, in bytes, from the chunk base
const UNITS_OFFSET: usize = 0;
const STATUS_OFFSET: usize = core::mem::size_of::<usize>();
const PREV_OFFSET: usize = UNIT_SIZE;
const NEXT_OFFSET: usize = UNIT_SIZE + core::mem::size_of::<usize>();

impl Chunk {
    #[inline]
    pub fn as_ptr(self) -> NonNull<u8> {
        self.0
    }

    #[inline]
    unsafe fn read_word(self, offset: usize) -> usize {
        self.0.as_ptr().add(offset).cast::<usize>().read()
    }

    #[inline]
    unsafe fn write_word(self, offset: usize, value: usize) {
        self.0.as_ptr().add(offset).cast::<usize>().write(value)
    }

    /// Wraps an address that is already known to be a valid chunk base.
    ///
    /// # Safety
    /// `base` must point at a live chunk header within the current heap.
    #[inline]
    pub unsafe fn from_base(base: NonNull<u8>) -> Chunk {
        Chunk(base)
    }

    /// Writes a fresh `Free` chunk header, footer, and (null) links at `base`.
    ///
    /// # Safety
    /// `base` must be valid for writes across `units * UNIT_SIZE` bytes, and
    /// that range must not overlap any other live chunk.
    pub unsafe fn new_free(base: NonNull<u8>, units: usize) -> Chunk {
        debug_assert!(units >= MIN_UNITS_PER_CHUNK);
        let c = Chunk(base);
        c.write_word(UNITS_OFFSET, units);
        c.write_word(STATUS_OFFSET, Status::Free as usize);
        c.set_prev_in_list(None);
        c.set_next_in_list(None);
        c.write_footer(units);
        c
    }

    #[inline]
    unsafe fn write_footer(self, units: usize) {
        let footer_offset = (units - 1) * UNIT_SIZE;
        self.write_word(footer_offset, units);
    }

    #[inline]
    pub fn units(self) -> usize {
        unsafe { self.read_word(UNITS_OFFSET) }
    }

    #[inline]
    pub fn footer_units(self) -> usize {
        let footer_offset = (self.units() - 1) * UNIT_SIZE;
        unsafe { self.read_word(footer_offset) }
    }

    /// Resizes the chunk in place, updating both header and footer.
    /// Status and list links are left untouched.
    ///
    /// # Safety
    /// `new_units` must not make the chunk's extent exceed storage the
    /// caller actually owns.
    pub unsafe fn resize(self, new_units: usize) {
        debug_assert!(new_units >= MIN_UNITS_PER_CHUNK);
        self.write_word(UNITS_OFFSET, new_units);
        self.write_footer(new_units);
    }

    #[inline]
    fn raw_status(self) -> usize {
        unsafe { self.read_word(STATUS_OFFSET) }
    }

    #[inline]
    pub fn status(self) -> Status {
        Status::from_raw(self.raw_status()).expect("corrupt chunk status")
    }

    #[inline]
    pub fn set_status(self, status: Status) {
        unsafe { self.write_word(STATUS_OFFSET, status as usize) }
    }

    #[inline]
    pub fn is_free(self) -> bool {
        self.status() == Status::Free
    }

    #[inline]
    pub fn prev_in_list(self) -> Option<Chunk> {
        let raw = unsafe { self.read_word(PREV_OFFSET) };
        NonNull::new(raw as *mut u8).map(Chunk)
    }

    #[inline]
    pub fn set_prev_in_list(self, prev: Option<Chunk>) {
        let raw = prev.map_or(0, |c| c.0.as_ptr() as usize);
        unsafe { self.write_word(PREV_OFFSET, raw) }
    }

    #[inline]
    pub fn next_in_list(self) -> Option<Chunk> {
        let raw = unsafe { self.read_word(NEXT_OFFSET) };
        NonNull::new(raw as *mut u8).map(Chunk)
    }

    #[inline]
    pub fn set_next_in_list(self, next: Option<Chunk>) {
        let raw = next.map_or(0, |c| c.0.as_ptr() as usize);
        unsafe { self.write_word(NEXT_OFFSET, raw) }
    }

    /// The chunk immediately to the right in memory, or `None` if this
    /// chunk's end coincides with `heap_end` (there is nothing after it).
    pub fn next_in_mem(self, heap_end: NonNull<u8>) -> Option<Chunk> {
        let next_addr = self.0.as_ptr().wrapping_add(self.units() * UNIT_SIZE);
        if next_addr == heap_end.as_ptr() {
            None
        } else {
            Some(Chunk(unsafe { NonNull::new_unchecked(next_addr) }))
        }
    }

    /// The chunk immediately to the left in memory, recovered via its
    /// footer, or `None` if this chunk starts at `heap_start`.
    pub fn prev_in_mem(self, heap_start: NonNull<u8>) -> Option<Chunk> {
        if self.0 == heap_start {
            return None;
        }
        let footer_addr = self.0.as_ptr().wrapping_sub(UNIT_SIZE);
        let prev_units = unsafe { footer_addr.cast::<usize>().read() };
        let prev_base = self.0.as_ptr().wrapping_sub(prev_units * UNIT_SIZE);
        Some(Chunk(unsafe { NonNull::new_unchecked(prev_base) }))
    }

    /// The user-visible payload address: one unit past the chunk base.
    #[inline]
    pub fn to_payload(self) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked(self.0.as_ptr().add(UNIT_SIZE)) }
    }

    /// Recovers the owning chunk from a payload address previously handed
    /// out by `to_payload`.
    ///
    /// # Safety
    /// `payload` must be a value returned by this allocator's `malloc` and
    /// not since freed.
    #[inline]
    pub unsafe fn from_payload(payload: NonNull<u8>) -> Chunk {
        Chunk(NonNull::new_unchecked(payload.as_ptr().sub(UNIT_SIZE)))
    }

    /// The total byte capacity of the chunk's payload region (excluding
    /// header and footer units).
    #[inline]
    pub fn payload_capacity(self) -> usize {
        (self.units() - 2) * UNIT_SIZE
    }

    /// Per §4.1: checks this chunk in isolation against the heap bounds.
    pub fn is_valid(self, heap_start: NonNull<u8>, heap_end: NonNull<u8>) -> bool {
        let base = self.0.as_ptr() as usize;
        if !(heap_start.as_ptr() as usize <= base && base < heap_end.as_ptr() as usize) {
            return false;
        }

        let units = self.units();
        if units < MIN_UNITS_PER_CHUNK {
            return false;
        }

        let end = base.wrapping_add(units * UNIT_SIZE);
        if end > heap_end.as_ptr() as usize {
            return false;
        }

        if Status::from_raw(self.raw_status()).is_none() {
            return false;
        }

        self.footer_units() == units
    }
}

/// Rounds a byte request up to whole units, reserving one unit for the
/// header and one for the footer (see `DESIGN.md` for why this differs
/// from a footer-less layout's `+1`).
#[inline]
pub const fn bytes_to_units(bytes: usize) -> usize {
    let payload_units = (bytes + UNIT_SIZE - 1) / UNIT_SIZE;
    payload_units + 2
}

#[inline]
pub const fn units_to_bytes(units: usize) -> usize {
    units * UNIT_SIZE
}
