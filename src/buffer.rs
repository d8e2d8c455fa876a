//! Triple-buffer publish/subscribe engine
//!
//! Three payload slots rotate `0 -> 1 -> 2 -> 0`; the header's
//! `active_index` always names a fully committed slot. A publish writes the
//! slot *after* the active one, so concurrent readers of the active slot are
//! never disturbed by an in-flight write. Readers that fall two publishes
//! behind race the writer into the same physical slot; the generation stamp
//! detects that and the read is reported as lapped instead of returning a
//! torn value.
//!
//! Exactly one writer per region at a time is a precondition, not a runtime
//! check. Payloads must be plain-old-data: `Copy`, no pointers, every bit
//! pattern valid (the region starts zero-filled).

use crate::error::{TribufError, TribufResult};
use crate::generation;
use crate::layout::{
    INITIAL_ACTIVE_SLOT, RegionHeader, RegionLayout, SLOT_COUNT, SharedRegion, TRIBUF_MAGIC,
};
use crate::meta::RegionInfo;
use crate::notify::{NotifyChannel, WaitStatus};
use crate::platform;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{Ordering, fence};
use std::time::{Duration, Instant};

/// Construction-time knobs for a region handle
///
/// The blocking-wait timeout and the region size are deliberately separate
/// concerns: the size is derived from the payload type, the timeout only
/// bounds `wait_for_update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Upper bound for a single `wait_for_update` call
    pub wait_timeout: Duration,
    /// Pre-fault the mapping during background initialization
    pub prefault: bool,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_millis(100),
            prefault: true,
        }
    }
}

/// Role selected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Create the backing file (if needed) and initialize the header
    Creator,
    /// Map an existing backing file without touching the header
    Attacher,
}

/// Outcome of a bounded blocking read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A new, consistent value was copied into the destination
    Updated,
    /// No publish within the timeout; the destination is untouched
    TimedOut,
    /// A publish occurred but this reader was lapped mid-copy; retry
    Lapped,
}

/// Handle to a triple-buffered shared region holding payloads of type `T`
///
/// Cloning is not supported; each participant opens its own handle. The
/// handle tracks the publish count it last observed, which is what
/// `wait_for_update` compares against.
pub struct TripleBuffer<T: Copy> {
    region: Arc<SharedRegion>,
    config: RegionConfig,
    role: Role,
    last_seen: u64,
    _payload: PhantomData<T>,
}

impl<T: Copy> TripleBuffer<T> {
    /// Open a region with an explicit role
    pub fn open(path: &Path, role: Role, config: RegionConfig) -> TribufResult<Self> {
        let layout = RegionLayout::for_payload::<T>()?;

        let mmap = match role {
            Role::Creator => platform::create_region_mmap(path, layout.total_size)?,
            Role::Attacher => {
                if !path.exists() {
                    return Err(TribufError::NotFound {
                        path: path.display().to_string(),
                    });
                }
                platform::attach_region_mmap(path)?
            }
        };

        let region = Arc::new(SharedRegion::new(path, mmap, layout)?);

        if role == Role::Creator {
            RegionInfo::for_region(&region, std::mem::size_of::<T>()).write()?;

            // The backing file may be left over from an earlier session.
            // Clear `ready` before handing off to the initializer so nobody
            // accepts the stale header while the wipe is in progress.
            region.header().ready.store(0, Ordering::Release);

            // Pre-faulting a large region can be slow, so header
            // initialization runs off-thread; poll `is_memory_mapped`.
            let init_region = Arc::clone(&region);
            let prefault = config.prefault;
            let payload_size = std::mem::size_of::<T>();
            std::thread::spawn(move || {
                initialize_region(&init_region, payload_size, prefault);
            });

            tracing::info!(path = %path.display(), size = layout.total_size, "region created");
        } else {
            tracing::debug!(path = %path.display(), "region attached");
        }

        // The creator resets the publish counter during initialization, so
        // its snapshot is always zero; attachers pick up the live count.
        let last_seen = match role {
            Role::Creator => 0,
            Role::Attacher => region.header().publish_seq.load(Ordering::Acquire),
        };

        Ok(Self {
            region,
            config,
            role,
            last_seen,
            _payload: PhantomData,
        })
    }

    /// Create a region as the writer/creator
    pub fn create(path: &Path, config: RegionConfig) -> TribufResult<Self> {
        Self::open(path, Role::Creator, config)
    }

    /// Attach to an existing region
    pub fn attach(path: &Path, config: RegionConfig) -> TribufResult<Self> {
        Self::open(path, Role::Attacher, config)
    }

    /// Whether the region's mapping and initialization have completed
    pub fn is_memory_mapped(&self) -> bool {
        let header = self.region.header();
        header.ready.load(Ordering::Acquire) == 1
            && header.magic.load(Ordering::Acquire) == TRIBUF_MAGIC
    }

    /// Poll until the region is ready, validating the payload size once it
    /// is. Fails with `NotReady` when `timeout` elapses first.
    pub fn wait_mapped(&self, timeout: Duration) -> TribufResult<()> {
        let start = Instant::now();
        while !self.is_memory_mapped() {
            if start.elapsed() >= timeout {
                return Err(TribufError::NotReady {
                    waited_ms: start.elapsed().as_millis() as u64,
                });
            }
            std::thread::sleep(Duration::from_micros(200));
        }

        let recorded = self.region.header().payload_size.load(Ordering::Acquire);
        if recorded != std::mem::size_of::<T>() as u64 {
            return Err(TribufError::PayloadMismatch {
                region: recorded,
                caller: std::mem::size_of::<T>() as u64,
            });
        }
        Ok(())
    }

    /// Index of the most recently published slot
    pub fn buffer_index(&self) -> u32 {
        self.region.header().active_index.load(Ordering::Acquire)
    }

    /// Total number of publishes observed by the region
    pub fn publish_count(&self) -> u64 {
        self.region.header().publish_seq.load(Ordering::Acquire)
    }

    /// Process ID of the region's creator
    pub fn writer_pid(&self) -> u32 {
        self.region.header().writer_pid.load(Ordering::Acquire)
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        self.region.path()
    }

    /// Total mapped region size in bytes
    pub fn region_size(&self) -> usize {
        self.region.total_size()
    }

    /// Role this handle was opened with
    pub fn role(&self) -> Role {
        self.role
    }

    /// Publish a new value: copy it into the next slot, advance the active
    /// index, and wake all waiters. Never blocks and holds no lock across
    /// the copy.
    pub fn publish(&mut self, value: &T) {
        let next = {
            let header = self.region.header();
            (header.active_index.load(Ordering::Acquire) + 1) % SLOT_COUNT
        };

        let slot = self.region.slot::<T>(next);
        generation::begin_write(slot.generation());
        fence(Ordering::Release);
        unsafe {
            std::ptr::copy_nonoverlapping(value, slot.payload_ptr(), 1);
        }
        fence(Ordering::Release);
        generation::end_write(slot.generation());

        self.region
            .header()
            .active_index
            .store(next, Ordering::Release);

        let count = self.notify().signal();
        self.last_seen = count;
        tracing::trace!(slot = next, count, "published");
    }

    /// Publish a duplicate of the current active payload. Same rotation and
    /// wake-up semantics as `publish`, for consumers keyed off index
    /// transitions rather than payload content.
    pub fn trigger(&mut self) {
        let active = self.region.header().active_index.load(Ordering::Acquire);
        let snapshot = unsafe { std::ptr::read(self.region.slot::<T>(active).payload_ptr()) };
        self.publish(&snapshot);
    }

    /// Non-blocking consistent read of the active slot into `out`.
    ///
    /// Returns `false` when the writer rotated into the slot mid-copy; the
    /// destination is untouched and the caller should retry.
    pub fn read(&self, out: &mut T) -> bool {
        let index = self.region.header().active_index.load(Ordering::Acquire);
        self.region.slot::<T>(index).read_into(out)
    }

    /// Block until a publish advances past this handle's last-observed
    /// count, then copy the new active payload into `out`.
    ///
    /// The timeout comes from the construction-time config. Timeout and
    /// lapped reads are ordinary outcomes, never errors.
    pub fn wait_for_update(&mut self, out: &mut T) -> WaitOutcome {
        let status = {
            let header = self.region.header();
            NotifyChannel::new(&header.publish_seq, &header.futex_word)
                .wait_past(self.last_seen, self.config.wait_timeout)
        };

        match status {
            WaitStatus::TimedOut => WaitOutcome::TimedOut,
            WaitStatus::Changed(count) => {
                self.last_seen = count;
                if self.read(out) {
                    WaitOutcome::Updated
                } else {
                    tracing::trace!(count, "reader lapped");
                    WaitOutcome::Lapped
                }
            }
        }
    }

    /// Direct reference to the active slot's payload, with no consistency
    /// guarantee: the writer may rotate into this slot at any time.
    ///
    /// # Safety
    ///
    /// The caller must not rely on the referenced value being coherent or
    /// stable; any read racing a writer that laps this slot is a data race.
    /// Use `read` or `wait_for_update` wherever correctness matters.
    pub unsafe fn buffer(&self) -> &T {
        let index = self.region.header().active_index.load(Ordering::Acquire);
        unsafe { &*self.region.slot::<T>(index).payload_ptr() }
    }

    fn notify(&self) -> NotifyChannel<'_> {
        let header = self.region.header();
        NotifyChannel::new(&header.publish_seq, &header.futex_word)
    }
}

/// Background initialization: pre-fault pages, then publish the header
/// start state. `ready` is stored last so attachers polling it observe a
/// fully initialized header.
fn initialize_region(region: &SharedRegion, payload_size: usize, prefault: bool) {
    if prefault {
        platform::prefault_region(region.base(), region.total_size());
    }

    // Wipe the slot array: creation promises a zero-filled region, and the
    // backing file may carry a previous session's payloads and generation
    // stamps (a crashed writer can even leave a generation odd).
    let header_size = std::mem::size_of::<RegionHeader>();
    unsafe {
        std::ptr::write_bytes(
            region.base().cast_mut().add(header_size),
            0,
            region.total_size() - header_size,
        );
    }

    let header = region.header();
    header.publish_seq.store(0, Ordering::Release);
    header.futex_word.store(0, Ordering::Release);
    header
        .payload_size
        .store(payload_size as u64, Ordering::Release);
    header
        .writer_pid
        .store(platform::get_current_pid(), Ordering::Release);
    header
        .active_index
        .store(INITIAL_ACTIVE_SLOT, Ordering::Release);
    header.magic.store(TRIBUF_MAGIC, Ordering::Release);
    header.ready.store(1, Ordering::Release);

    tracing::debug!(size = region.total_size(), "region initialized");
}
