//! Cross-process notification channel over the shared publish counter
//!
//! A 64-bit publish counter orders all publishes; a 32-bit futex word
//! mirrors its low bits so waiters can block in the kernel. Waiters compare
//! the counter before and after sleeping, which closes the missed-wakeup
//! window: a publish that lands between the snapshot and the futex call is
//! caught by the kernel-side value check.

use crate::platform;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Outcome of a bounded wait on the publish counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// Counter advanced past the caller's snapshot; carries the new value
    Changed(u64),
    /// No publish within the timeout
    TimedOut,
}

/// Wait/notify primitive borrowed from a region header
pub struct NotifyChannel<'a> {
    seq: &'a AtomicU64,
    word: &'a AtomicU32,
}

impl<'a> NotifyChannel<'a> {
    /// Build a channel over a publish counter and its futex word
    pub fn new(seq: &'a AtomicU64, word: &'a AtomicU32) -> Self {
        Self { seq, word }
    }

    /// Current publish count
    pub fn publish_count(&self) -> u64 {
        self.seq.load(Ordering::Acquire)
    }

    /// Record one publish and wake every waiter
    pub fn signal(&self) -> u64 {
        let count = self.seq.fetch_add(1, Ordering::AcqRel) + 1;
        self.word.store(count as u32, Ordering::Release);
        platform::futex_wake_all(self.word);
        count
    }

    /// Block until the publish count differs from `seen` or `timeout`
    /// elapses. Spurious kernel wakeups are absorbed by re-checking the
    /// counter.
    pub fn wait_past(&self, seen: u64, timeout: Duration) -> WaitStatus {
        let deadline = Instant::now() + timeout;

        loop {
            let current = self.seq.load(Ordering::Acquire);
            if current != seen {
                return WaitStatus::Changed(current);
            }

            let now = Instant::now();
            if now >= deadline {
                return WaitStatus::TimedOut;
            }

            platform::futex_wait(self.word, current as u32, Some(deadline - now));
        }
    }
}
