//! Array store trait definition.

use crate::array::{ArraySpec, AttrValue};
use crate::error::StoreResult;
use std::ops::Range;

/// A hierarchical store of chunked, resizable arrays.
///
/// Paths are slash-separated strings (`data/demo_17/obs`). Interior path
/// components name groups; leaf components name datasets. Every dataset has
/// a growable leading axis and a fixed item shape.
///
/// # Invariants
///
/// - `create_array` creates missing parent groups and fails if the path is
///   already occupied
/// - `resize_rows` only grows the leading axis; rows already written are
///   never moved or rewritten
/// - `write_rows` copies whole rows; the source buffer's row stride must
///   equal the dataset's item byte width
/// - `flush` ensures all prior mutations are durable
/// - Stores must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - for tests and ephemeral collection
pub trait ArrayStore: Send + Sync {
    /// Returns whether a dataset or group exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Creates a resizable array at `path`.
    ///
    /// The array starts `spec.initial_rows` long and may grow without bound
    /// along the leading axis. Missing parent groups are created.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `path` is already occupied by a dataset or group
    /// - a parent component of `path` is a dataset
    /// - an I/O error occurs
    fn create_array(&mut self, path: &str, spec: ArraySpec) -> StoreResult<()>;

    /// Grows the leading axis of the array at `path` to `new_rows`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no dataset exists at `path`
    /// - `new_rows` is smaller than the current length
    /// - an I/O error occurs
    fn resize_rows(&mut self, path: &str, new_rows: u64) -> StoreResult<()>;

    /// Copies rows `src_rows` of `src` into the array at `path`, starting
    /// at row `dst_row`.
    ///
    /// `src` is a row-major buffer whose row stride equals the dataset's
    /// item byte width.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no dataset exists at `path`
    /// - `src` is not a whole number of rows
    /// - `src_rows` extends beyond `src`
    /// - the destination range extends beyond the allocated rows
    /// - an I/O error occurs
    fn write_rows(
        &mut self,
        path: &str,
        src: &[u8],
        src_rows: Range<usize>,
        dst_row: u64,
    ) -> StoreResult<()>;

    /// Sets a scalar attribute on the dataset or group at `path`.
    ///
    /// Setting an existing key overwrites its value.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing exists at `path` or an I/O error occurs.
    fn set_attr(&mut self, path: &str, key: &str, value: AttrValue) -> StoreResult<()>;

    /// Lists the immediate child names under the group at `path`.
    ///
    /// The empty path addresses the root group.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a group or an I/O error occurs.
    fn list_children(&self, path: &str) -> StoreResult<Vec<String>>;

    /// Flushes all pending mutations to durable storage.
    ///
    /// After this returns successfully, every prior creation, resize, write
    /// and attribute is guaranteed to survive process termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StoreResult<()>;
}
