//! Error types for array store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during array store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The addressed path does not exist.
    #[error("path not found: {path}")]
    NotFound {
        /// The path that was addressed.
        path: String,
    },

    /// An array or group already exists at the addressed path.
    #[error("path already exists: {path}")]
    AlreadyExists {
        /// The path that was addressed.
        path: String,
    },

    /// A dataset sits where a group was required.
    #[error("not a group: {path}")]
    NotAGroup {
        /// The offending path.
        path: String,
    },

    /// Attempted to shrink an array.
    #[error("invalid resize of {path}: {from} -> {to} rows (arrays only grow)")]
    InvalidResize {
        /// The array being resized.
        path: String,
        /// The current leading-axis length.
        from: u64,
        /// The requested leading-axis length.
        to: u64,
    },

    /// A row range fell outside the allocated rows of a buffer or array.
    #[error("row range {start}..{end} out of bounds for {path} ({rows} rows)")]
    OutOfBounds {
        /// The array being written.
        path: String,
        /// First row of the offending range.
        start: u64,
        /// One past the last row of the offending range.
        end: u64,
        /// Rows available.
        rows: u64,
    },

    /// A source buffer is not a whole number of rows.
    #[error("source layout mismatch for {path}: {len} bytes is not a whole number of {item_nbytes}-byte rows")]
    LayoutMismatch {
        /// The array being written.
        path: String,
        /// Length of the source buffer in bytes.
        len: usize,
        /// Byte width of one row of the target array.
        item_nbytes: usize,
    },
}
