//! # Tribuf: Triple-Buffered Shared Memory Exchange
//!
//! Low-latency, single-writer/multi-reader data exchange between independent
//! processes (or threads) over a memory-mapped backing file, with no
//! kernel-mediated locks on the hot path.
//!
//! ## How it works
//!
//! A region is one control header plus exactly three payload slots:
//!
//! ```text
//! +-----------------+   +--------+--------+--------+
//! | RegionHeader    |   | Slot 0 | Slot 1 | Slot 2 |
//! | active_index    |   |  gen   |  gen   |  gen   |
//! | publish counter |   | payload| payload| payload|
//! | futex word      |   +--------+--------+--------+
//! +-----------------+
//! ```
//!
//! The writer always copies into the slot *after* the active one, stamps its
//! generation counter, then atomically advances `active_index` and wakes
//! waiters through a futex word living in the header. Readers copy the
//! active slot and validate the generation before and after the copy: a
//! mismatch means the writer lapped them, and the read reports corruption
//! instead of returning a torn value.
//!
//! ## Guarantees
//!
//! - **Lock-free hot path**: publish and read touch only atomics; the futex
//!   is used solely by the blocking-wait path.
//! - **Monotonic visibility**: once `publish` returns, every subsequent read
//!   observes that publish or a later one.
//! - **Rotation order**: `0 -> 1 -> 2 -> 0 -> ...`, starting at slot 1 after
//!   creator initialization.
//! - **Persistence**: teardown unmaps but leaves the backing file for later
//!   attachers; the region outlives any single process.
//!
//! ## Preconditions
//!
//! Exactly one active writer per region at a time, and identical payload
//! layout across every participant. Neither is detected at runtime. Payloads
//! must be plain-old-data (`Copy`, no pointers, all bit patterns valid).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tribuf::{RegionConfig, TripleBuffer, WaitOutcome};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! #[derive(Clone, Copy)]
//! struct Telemetry {
//!     value: i32,
//!     timestamp: u64,
//! }
//!
//! # fn main() -> tribuf::TribufResult<()> {
//! // Producer
//! let path = Path::new("/dev/shm/telemetry");
//! let mut writer = TripleBuffer::<Telemetry>::create(path, RegionConfig::default())?;
//! writer.wait_mapped(Duration::from_secs(1))?;
//! writer.publish(&Telemetry { value: 10, timestamp: 0 });
//!
//! // Consumer (typically another process)
//! let mut reader = TripleBuffer::<Telemetry>::attach(path, RegionConfig::default())?;
//! reader.wait_mapped(Duration::from_secs(1))?;
//! let mut out = Telemetry { value: 0, timestamp: 0 };
//! match reader.wait_for_update(&mut out) {
//!     WaitOutcome::Updated => { /* fresh data in `out` */ }
//!     WaitOutcome::TimedOut => { /* idle, retry later */ }
//!     WaitOutcome::Lapped => { /* overtaken mid-copy, retry now */ }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod error;
pub mod generation;
pub mod layout;
pub mod meta;
pub mod notify;
pub mod platform;

pub use buffer::{RegionConfig, Role, TripleBuffer, WaitOutcome};
pub use error::{TribufError, TribufResult};
pub use layout::{
    CACHE_LINE_SIZE, INITIAL_ACTIVE_SLOT, RegionHeader, RegionLayout, SLOT_COUNT, SharedRegion,
    Slot, TRIBUF_MAGIC,
};
pub use meta::RegionInfo;
pub use notify::{NotifyChannel, WaitStatus};

/// Initialize tracing with minimal overhead for latency-sensitive callers
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
