//! Error types for raster dataset access.

use thiserror::Error;

/// Errors raised by raster store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No dataset at the given path.
    #[error("dataset not found: {0}")]
    NotFound(String),

    /// A dataset already exists at the given path.
    #[error("dataset already exists: {0}")]
    AlreadyExists(String),

    /// Requested band index is outside the dataset's band count.
    #[error("band {band} out of range for {path} ({count} bands)")]
    BandOutOfRange {
        path: String,
        band: usize,
        count: usize,
    },

    /// Requested row window is outside the dataset's height.
    #[error("row window {start}..{end} outside raster height {height}")]
    WindowOutOfRange {
        start: usize,
        end: usize,
        height: usize,
    },

    /// Band data does not match the profile's dimensions.
    #[error("band data has {actual} values, profile expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for raster store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
