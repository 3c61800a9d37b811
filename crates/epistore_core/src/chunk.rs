//! Chunk sizing policy for newly created datasets.

use crate::error::CoreResult;
use crate::size::SizeSpec;

/// Chunk sizing policy, applied once when a dataset is created.
///
/// Growing a dataset never recomputes its chunking; the shape chosen at
/// creation stands for the dataset's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPolicy {
    /// Delegate chunk sizing entirely to the store.
    Auto,
    /// A fixed number of rows per chunk along the time axis.
    Length(u64),
    /// A byte budget per chunk; the row count is derived from the item
    /// byte width, flooring at one row per chunk.
    Bytes(u64),
}

impl ChunkPolicy {
    /// Builds a policy from a parsed size spec: `Auto` stays `Auto`, a
    /// byte count becomes a byte budget.
    #[must_use]
    pub const fn from_spec(spec: SizeSpec) -> Self {
        match spec {
            SizeSpec::Auto => Self::Auto,
            SizeSpec::Bytes(n) => Self::Bytes(n),
        }
    }

    /// Parses a byte-budget policy from a size string like `"64KB"`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSizeSpec`](crate::CoreError::InvalidSizeSpec)
    /// for malformed size strings.
    pub fn bytes_spec(spec: &str) -> CoreResult<Self> {
        Ok(Self::from_spec(SizeSpec::parse(spec)?))
    }

    /// Returns the rows per chunk for an item of `item_nbytes`, or `None`
    /// when chunking is delegated to the store.
    ///
    /// A byte budget smaller than one item still yields one row per chunk.
    #[must_use]
    pub fn chunk_rows(self, item_nbytes: usize) -> Option<u64> {
        match self {
            Self::Auto => None,
            Self::Length(rows) => Some(rows),
            Self::Bytes(budget) => Some((budget / (item_nbytes.max(1) as u64)).max(1)),
        }
    }

    /// Assembles the full chunk shape `(rows, *item_shape)` for a dataset,
    /// or `None` when chunking is delegated to the store.
    #[must_use]
    pub fn chunk_shape(self, item_shape: &[u64], item_nbytes: usize) -> Option<Vec<u64>> {
        self.chunk_rows(item_nbytes).map(|rows| {
            let mut shape = Vec::with_capacity(1 + item_shape.len());
            shape.push(rows);
            shape.extend_from_slice(item_shape);
            shape
        })
    }
}
