//! Error types for the tessel engine.
//!
//! All crates return `TesselResult<T>` from fallible operations.
//! Local algorithmic edge cases (pair-buffer overflow, degenerate
//! bounds) are absorbed where they happen and never show up here.

use thiserror::Error;

/// Unified error type for the tessel engine.
#[derive(Debug, Error)]
pub enum TesselError {
    /// Mesh data is malformed or inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Device or dispatch failure.
    #[error("GPU error: {0}")]
    Gpu(String),

    /// The caller-supplied sort scratch cannot hold the working set.
    #[error("Sort scratch too small: {required} slots required, {available} available")]
    SortScratchTooSmall {
        required: usize,
        available: usize,
    },

    /// A synchronization barrier read back an unexpected sentinel.
    #[error("Barrier sentinel mismatch: expected ticket {expected}, observed {observed}")]
    BarrierMismatch {
        expected: u32,
        observed: u32,
    },

    /// A workspace could not be planned for the requested size.
    #[error("Capacity plan failed: {0}")]
    CapacityPlan(String),
}

/// Convenience alias for `Result<T, TesselError>`.
pub type TesselResult<T> = Result<T, TesselError>;
