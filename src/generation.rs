//! Even/odd generation stamping for torn-read detection
//!
//! Every slot carries a generation counter. Writers bump it to an odd value
//! before touching the payload and to an even value after, so a reader can
//! take a snapshot copy and reject it if the counter moved (or was odd)
//! while the copy was in flight.

use std::sync::atomic::{AtomicU64, Ordering, fence};

/// Begin overwriting a slot: generation becomes odd
pub fn begin_write(generation: &AtomicU64) -> u64 {
    generation.fetch_add(1, Ordering::AcqRel) + 1
}

/// Commit a slot overwrite: generation becomes even again
pub fn end_write(generation: &AtomicU64) -> u64 {
    generation.fetch_add(1, Ordering::AcqRel) + 1
}

/// A stable (fully committed) generation is even
pub fn is_stable(generation: u64) -> bool {
    generation % 2 == 0
}

/// Snapshot-copy `src` into `out`, validating the generation before and
/// after the copy. Returns `false` if the slot was being overwritten or was
/// rotated into mid-copy; `out` is untouched in that case.
///
/// # Safety
///
/// `src` must point to payload storage of at least `size_of::<T>()` bytes
/// that stays mapped for the duration of the call. The storage must hold a
/// bit pattern valid for `T` (plain-old-data payloads only).
pub unsafe fn copy_consistent<T: Copy>(generation: &AtomicU64, src: *const T, out: &mut T) -> bool {
    let before = generation.load(Ordering::Acquire);
    if !is_stable(before) {
        return false;
    }

    fence(Ordering::Acquire);

    let mut snapshot = std::mem::MaybeUninit::<T>::uninit();
    unsafe {
        std::ptr::copy_nonoverlapping(src, snapshot.as_mut_ptr(), 1);
    }

    fence(Ordering::Acquire);

    if generation.load(Ordering::Acquire) != before {
        return false;
    }

    // Generation held steady across the copy, so the bytes are coherent.
    *out = unsafe { snapshot.assume_init() };
    true
}
