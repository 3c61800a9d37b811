//! Error types for the collection engine.

use epistore_storage::{Dtype, StoreError};
use thiserror::Error;

/// Result type for collection engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the collection engine.
///
/// All errors surface synchronously from the operation that detected them;
/// the engine never retries internally. After a failed flush the caller
/// must assume partial persistence (some datasets may have been created or
/// grown).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Array store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Added data's row count disagrees with the collector width or the
    /// mask's active-slot count.
    #[error("field `{field}`: batch carries {actual} rows, expected {expected}")]
    BatchWidthMismatch {
        /// The field being added.
        field: String,
        /// Rows the engine expected.
        expected: usize,
        /// Rows the batch carried.
        actual: usize,
    },

    /// A mask's slot count disagrees with the collector width.
    #[error("mask covers {actual} slots, collector width is {expected}")]
    MaskWidthMismatch {
        /// The collector's batch width.
        expected: usize,
        /// Slots the mask covered.
        actual: usize,
    },

    /// A field's item shape changed across records.
    #[error("field `{field}`: item shape {actual:?} does not match established {expected:?}")]
    ShapeMismatch {
        /// The offending field.
        field: String,
        /// The shape fixed when the field was first seen.
        expected: Vec<u64>,
        /// The shape of the rejected record.
        actual: Vec<u64>,
    },

    /// A field's element type changed across records.
    #[error("field `{field}`: dtype {actual} does not match established {expected}")]
    DtypeMismatch {
        /// The offending field.
        field: String,
        /// The dtype fixed when the field was first seen.
        expected: Dtype,
        /// The dtype of the rejected record.
        actual: Dtype,
    },

    /// A memory size string could not be parsed.
    #[error("invalid size specification: {spec}")]
    InvalidSizeSpec {
        /// The rejected specification.
        spec: String,
    },

    /// An attribute write referenced a dataset or episode entry that was
    /// never created.
    #[error("attribute target does not exist: {path}")]
    MissingTarget {
        /// The missing path.
        path: String,
    },

    /// A batch could not be assembled from the given values.
    #[error("invalid batch: {message}")]
    InvalidBatch {
        /// Description of the problem.
        message: String,
    },

    /// The collector configuration is unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid size specification error.
    pub fn invalid_size_spec(spec: impl Into<String>) -> Self {
        Self::InvalidSizeSpec { spec: spec.into() }
    }

    /// Creates a missing attribute target error.
    pub fn missing_target(path: impl Into<String>) -> Self {
        Self::MissingTarget { path: path.into() }
    }

    /// Creates an invalid batch error.
    pub fn invalid_batch(message: impl Into<String>) -> Self {
        Self::InvalidBatch {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
