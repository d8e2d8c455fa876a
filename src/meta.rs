//! Region metadata sidecar for external tooling
//!
//! Creators drop a small JSON description next to the backing file so
//! monitors and debug tools can discover regions without mapping them. The
//! sidecar is informational only; the engine never reads it on the hot path.

use crate::error::TribufResult;
use crate::layout::{SLOT_COUNT, SharedRegion};
use crate::platform;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Describes a triple-buffer region on disk
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegionInfo {
    /// Backing file path
    pub path: String,
    /// Payload size in bytes
    pub payload_size: usize,
    /// Number of payload slots
    pub slot_count: u32,
    /// Total region size in bytes
    pub region_size: usize,
    /// Creator process ID
    pub writer_pid: u32,
    /// Creation timestamp
    pub created_at: SystemTime,
}

impl RegionInfo {
    /// Describe a freshly created region
    pub fn for_region(region: &SharedRegion, payload_size: usize) -> Self {
        Self {
            path: region.path().display().to_string(),
            payload_size,
            slot_count: SLOT_COUNT,
            region_size: region.total_size(),
            writer_pid: platform::get_current_pid(),
            created_at: SystemTime::now(),
        }
    }

    /// Sidecar path for a region backing file (`<path>.meta`)
    pub fn sidecar_path(region_path: &Path) -> PathBuf {
        let mut os = region_path.as_os_str().to_os_string();
        os.push(".meta");
        PathBuf::from(os)
    }

    /// Write the sidecar next to the backing file
    pub fn write(&self) -> TribufResult<()> {
        let sidecar = Self::sidecar_path(Path::new(&self.path));
        let json = serde_json::to_string_pretty(self)?;

        let mut file = std::fs::File::create(&sidecar)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load the sidecar for a region backing file
    pub fn load(region_path: &Path) -> TribufResult<Self> {
        let sidecar = Self::sidecar_path(region_path);
        let json = std::fs::read_to_string(sidecar)?;
        Ok(serde_json::from_str(&json)?)
    }
}
