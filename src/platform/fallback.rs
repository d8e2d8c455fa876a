//! Portable wait/wake fallback for platforms without futexes
//!
//! Polls the word with a short sleep instead of blocking in the kernel.
//! Latency is worse than the Linux path but the observable contract is the
//! same: return on change or timeout, callers re-check in a loop.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_micros(500);

/// Poll until `word` moves away from `expected` or the timeout elapses
pub fn futex_wait(word: &AtomicU32, expected: u32, timeout: Option<Duration>) {
    let deadline = timeout.map(|t| Instant::now() + t);

    loop {
        if word.load(Ordering::Acquire) != expected {
            return;
        }
        if let Some(d) = deadline {
            if Instant::now() >= d {
                return;
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// No-op: pollers notice the word change on their next wakeup
pub fn futex_wake_all(_word: &AtomicU32) {}
