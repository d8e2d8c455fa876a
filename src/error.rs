//! Error types for triple-buffer region operations

use thiserror::Error;

/// Errors that can occur while creating, attaching to, or inspecting a region
#[derive(Error, Debug)]
pub enum TribufError {
    /// Backing file does not exist (attach-only role)
    #[error("Backing file not found: {path}")]
    NotFound {
        /// Backing file path
        path: String,
    },

    /// Payload type cannot be laid out in a shared region
    #[error("Payload layout not mappable: size {size}, alignment {align}")]
    InvalidLayout {
        /// Payload size in bytes
        size: usize,
        /// Payload alignment in bytes
        align: usize,
    },

    /// Backing file size does not match the expected region layout
    #[error("Region size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        /// Expected total region size
        expected: u64,
        /// Actual backing file size
        actual: u64,
    },

    /// Attached region was built for a different payload size
    #[error("Payload size mismatch: region holds {region} bytes, caller expects {caller}")]
    PayloadMismatch {
        /// Payload size recorded in the region header
        region: u64,
        /// Payload size of the attaching caller
        caller: u64,
    },

    /// Region initialization did not complete within the polling window
    #[error("Region not ready after {waited_ms} ms")]
    NotReady {
        /// Time spent polling, in milliseconds
        waited_ms: u64,
    },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        /// Source JSON error
        #[from]
        source: serde_json::Error,
    },
}

/// Result type for triple-buffer region operations
pub type TribufResult<T> = Result<T, TribufError>;
