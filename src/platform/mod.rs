//! Platform layer: memory mapping and the cross-process wake primitive

use crate::error::TribufResult;
use memmap2::{MmapMut, MmapOptions};
use nix::unistd::getpid;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::{futex_wait, futex_wake_all};

#[cfg(not(target_os = "linux"))]
mod fallback;
#[cfg(not(target_os = "linux"))]
pub use fallback::{futex_wait, futex_wake_all};

/// Create the backing file (zero-filled to `size`) and map it read/write
pub fn create_region_mmap(path: &Path, size: usize) -> TribufResult<MmapMut> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .mode(0o600) // Owner read/write only
        .open(path)?;

    file.set_len(size as u64)?;

    let mmap = unsafe { MmapOptions::new().map_mut(&file)? };
    Ok(mmap)
}

/// Map an existing backing file read/write
pub fn attach_region_mmap(path: &Path) -> TribufResult<MmapMut> {
    let file = OpenOptions::new().read(true).write(true).open(path)?;

    let mmap = unsafe { MmapOptions::new().map_mut(&file)? };
    Ok(mmap)
}

/// Pre-fault every page of a mapped range so later accesses never stall
/// on demand paging. Best effort; failure is not fatal.
pub fn prefault_region(addr: *const u8, len: usize) {
    #[cfg(target_os = "linux")]
    {
        let ret = unsafe { libc::mlock(addr as *const libc::c_void, len) };
        if ret == 0 {
            return;
        }
        tracing::debug!("mlock failed, falling back to page touch");
    }

    let page = page_size();
    let mut offset = 0;
    while offset < len {
        unsafe {
            std::ptr::read_volatile(addr.add(offset));
        }
        offset += page;
    }
}

/// System page size in bytes
pub fn page_size() -> usize {
    let ret = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if ret > 0 { ret as usize } else { 4096 }
}

/// Get current process ID
pub fn get_current_pid() -> u32 {
    getpid().as_raw() as u32
}
