//! Linux futex-based wait/wake for words living in shared memory
//!
//! The futex word sits inside the mapped region, so `FUTEX_WAIT` /
//! `FUTEX_WAKE` are issued without `FUTEX_PRIVATE_FLAG` and the kernel
//! matches waiters across process boundaries.

use nix::errno::Errno;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

/// Sleep until `word` is woken or changes away from `expected`.
///
/// Returns on wake, timeout, signal delivery, or when the kernel observes
/// `*word != expected` (EAGAIN). Callers re-check their condition in a loop,
/// so every return path is treated the same way here.
pub fn futex_wait(word: &AtomicU32, expected: u32, timeout: Option<Duration>) {
    let ts;
    let ts_ptr = match timeout {
        Some(d) => {
            ts = libc::timespec {
                tv_sec: d.as_secs() as libc::time_t,
                tv_nsec: d.subsec_nanos() as libc::c_long,
            };
            &ts as *const libc::timespec
        }
        None => std::ptr::null(),
    };

    let ret = unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAIT,
            expected,
            ts_ptr,
            std::ptr::null::<u32>(),
            0u32,
        )
    };

    if ret < 0 {
        match Errno::last() {
            // Expected outcomes: value moved, timer fired, or a signal landed.
            Errno::EAGAIN | Errno::ETIMEDOUT | Errno::EINTR => {}
            e => tracing::warn!("futex wait failed: {e}"),
        }
    }
}

/// Wake every process currently blocked on `word`
pub fn futex_wake_all(word: &AtomicU32) {
    let ret = unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAKE,
            i32::MAX,
            std::ptr::null::<libc::timespec>(),
            std::ptr::null::<u32>(),
            0u32,
        )
    };

    if ret < 0 {
        tracing::warn!("futex wake failed: {}", Errno::last());
    }
}
