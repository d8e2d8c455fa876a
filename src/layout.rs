//! Shared region layout: control header, slot array, mapped-region wrapper
//!
//! ```text
//! +--------------------------------------------------+
//! | RegionHeader (64 bytes, cache-aligned)           |
//! +--------------------------------------------------+
//! | Slot[0]  { generation | payload }                |
//! | Slot[1]  { generation | payload }                |
//! | Slot[2]  { generation | payload }                |
//! +--------------------------------------------------+
//! ```
//!
//! The header holds only atomic-capable primitives; nothing in the region
//! stores a process-local address.

use crate::error::{TribufError, TribufResult};
use crate::generation;
use memmap2::MmapMut;
use std::cell::UnsafeCell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64};

/// Magic number identifying a tribuf region
pub const TRIBUF_MAGIC: u64 = 0x5452_4942_5546_0001;

/// Number of payload slots in a region
pub const SLOT_COUNT: u32 = 3;

/// Slot exposed as active right after creator initialization. Slot 0 is the
/// startup placeholder and is never active before the first publish cycles
/// back around to it.
pub const INITIAL_ACTIVE_SLOT: u32 = 1;

/// Cache line size used for header alignment
pub const CACHE_LINE_SIZE: usize = 64;

/// Region control header with cache-line alignment
#[repr(C, align(64))]
pub struct RegionHeader {
    /// Magic number for validation, stored last during initialization
    pub magic: AtomicU64,
    /// Payload size recorded at creation, checked by attachers
    pub payload_size: AtomicU64,
    /// Set to 1 once mapping and zero-initialization are complete
    pub ready: AtomicU32,
    /// Index of the most recently published slot
    pub active_index: AtomicU32,
    /// Total publish count; waiters compare it against their last-seen value
    pub publish_seq: AtomicU64,
    /// Futex word mirroring the low bits of `publish_seq`
    pub futex_word: AtomicU32,
    /// Creator process ID
    pub writer_pid: AtomicU32,
    _pad: [u8; 24],
}

/// One payload slot: generation stamp adjacent to the payload bytes
#[repr(C)]
pub struct Slot<T> {
    generation: AtomicU64,
    payload: UnsafeCell<T>,
}

// Slots live in shared memory and are accessed from many threads; all
// mutation goes through the generation protocol.
unsafe impl<T: Copy + Send> Sync for Slot<T> {}

impl<T: Copy> Slot<T> {
    /// Generation counter for this slot
    pub fn generation(&self) -> &AtomicU64 {
        &self.generation
    }

    /// Raw pointer to the payload storage
    pub fn payload_ptr(&self) -> *mut T {
        self.payload.get()
    }

    /// Consistent snapshot copy of the payload into `out`.
    ///
    /// Returns `false` (leaving `out` untouched) if the slot was being
    /// overwritten or got rotated into during the copy.
    pub fn read_into(&self, out: &mut T) -> bool {
        unsafe { generation::copy_consistent(&self.generation, self.payload.get(), out) }
    }
}

/// Byte layout of a region for a given payload type
#[derive(Debug, Clone, Copy)]
pub struct RegionLayout {
    /// Header size in bytes
    pub header_size: usize,
    /// Per-slot stride in bytes (generation stamp + payload + padding)
    pub slot_size: usize,
    /// Total region size in bytes
    pub total_size: usize,
}

impl RegionLayout {
    /// Compute and validate the layout for payload type `T`
    pub fn for_payload<T: Copy>() -> TribufResult<Self> {
        let size = std::mem::size_of::<T>();
        let align = std::mem::align_of::<Slot<T>>();
        let header_size = std::mem::size_of::<RegionHeader>();

        // Slots start right after the header, so their alignment must
        // divide the header size.
        if size == 0 || header_size % align != 0 {
            return Err(TribufError::InvalidLayout {
                size,
                align: std::mem::align_of::<T>(),
            });
        }

        let slot_size = std::mem::size_of::<Slot<T>>();
        Ok(Self {
            header_size,
            slot_size,
            total_size: header_size + SLOT_COUNT as usize * slot_size,
        })
    }
}

/// A mapped shared region: header plus slot array
///
/// Dropping unmaps and closes the handle but intentionally leaves the
/// backing file and its content for subsequent attachers.
pub struct SharedRegion {
    path: PathBuf,
    base: *mut u8,
    total_size: usize,
    _mmap: MmapMut,
}

// The region is raw shared memory; all concurrent access is mediated by the
// header atomics and the slot generation protocol.
unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}

impl SharedRegion {
    /// Wrap a mapping, validating its base alignment and size
    pub fn new(path: &Path, mut mmap: MmapMut, layout: RegionLayout) -> TribufResult<Self> {
        if mmap.len() < layout.total_size {
            return Err(TribufError::SizeMismatch {
                expected: layout.total_size as u64,
                actual: mmap.len() as u64,
            });
        }

        let base = mmap.as_mut_ptr();
        if base as usize % CACHE_LINE_SIZE != 0 {
            return Err(TribufError::InvalidLayout {
                size: layout.total_size,
                align: CACHE_LINE_SIZE,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            base,
            total_size: layout.total_size,
            _mmap: mmap,
        })
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total mapped size in bytes
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Base address of the mapping
    pub fn base(&self) -> *const u8 {
        self.base
    }

    /// Control header at the start of the region
    pub fn header(&self) -> &RegionHeader {
        unsafe { &*(self.base as *const RegionHeader) }
    }

    /// Slot `index` of the region's slot array
    ///
    /// Panics if `index` is out of range; callers derive it from
    /// `active_index`, which is always in `{0, 1, 2}`.
    pub fn slot<T: Copy>(&self, index: u32) -> &Slot<T> {
        assert!(index < SLOT_COUNT);
        let offset =
            std::mem::size_of::<RegionHeader>() + index as usize * std::mem::size_of::<Slot<T>>();
        unsafe { &*(self.base.add(offset) as *const Slot<T>) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_header_is_one_cache_line() {
        assert_eq!(std::mem::size_of::<RegionHeader>(), CACHE_LINE_SIZE);
        assert_eq!(std::mem::align_of::<RegionHeader>(), CACHE_LINE_SIZE);
    }

    #[test]
    fn test_layout_math() {
        #[derive(Clone, Copy)]
        struct Payload {
            _value: i32,
            _timestamp: u64,
        }

        let layout = RegionLayout::for_payload::<Payload>().unwrap();
        assert_eq!(layout.header_size, 64);
        assert_eq!(layout.slot_size, 8 + std::mem::size_of::<Payload>());
        assert_eq!(layout.total_size, 64 + 3 * layout.slot_size);
    }

    #[test]
    fn test_overaligned_payload_rejected() {
        #[derive(Clone, Copy)]
        #[repr(C, align(128))]
        struct Huge {
            _b: u8,
        }

        assert!(matches!(
            RegionLayout::for_payload::<Huge>(),
            Err(TribufError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn test_slot_read_into() {
        let slot = Slot {
            generation: AtomicU64::new(2),
            payload: UnsafeCell::new(99u64),
        };

        let mut out = 0u64;
        assert!(slot.read_into(&mut out));
        assert_eq!(out, 99);

        // Odd generation: a write is in flight, snapshot must be refused.
        slot.generation.store(3, Ordering::Release);
        assert!(!slot.read_into(&mut out));
        assert_eq!(out, 99);
    }

    #[test]
    fn test_region_wrapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region");
        let layout = RegionLayout::for_payload::<u64>().unwrap();

        let mmap = crate::platform::create_region_mmap(&path, layout.total_size).unwrap();
        let region = SharedRegion::new(&path, mmap, layout).unwrap();

        assert_eq!(region.total_size(), layout.total_size);
        assert_eq!(region.header().magic.load(Ordering::Acquire), 0);
        assert_eq!(region.slot::<u64>(2).generation().load(Ordering::Acquire), 0);
    }
}
