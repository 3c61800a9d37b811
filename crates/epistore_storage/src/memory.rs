//! In-memory array store for testing and ephemeral collection.

use crate::array::{ArraySpec, AttrValue, Compression, Dtype};
use crate::error::{StoreError, StoreResult};
use crate::store::ArrayStore;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

#[derive(Debug)]
struct Dataset {
    dtype: Dtype,
    item_shape: Vec<u64>,
    item_nbytes: usize,
    rows: u64,
    chunk_shape: Option<Vec<u64>>,
    compression: Option<Compression>,
    data: Vec<u8>,
    attrs: HashMap<String, AttrValue>,
}

#[derive(Debug, Default)]
struct Inner {
    datasets: BTreeMap<String, Dataset>,
    groups: BTreeMap<String, HashMap<String, AttrValue>>,
}

/// An in-memory array store.
///
/// Holds all datasets and group attributes in memory. Suitable for:
/// - Unit and integration tests
/// - Ephemeral collection that never needs to survive the process
///
/// # Thread Safety
///
/// The store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use epistore_storage::{ArraySpec, ArrayStore, Dtype, InMemoryStore};
///
/// let mut store = InMemoryStore::new();
/// store
///     .create_array(
///         "data/demo_0/a",
///         ArraySpec {
///             initial_rows: 2,
///             item_shape: vec![],
///             dtype: Dtype::U8,
///             chunk_shape: None,
///             compression: None,
///         },
///     )
///     .unwrap();
/// store.write_rows("data/demo_0/a", &[7, 9], 0..2, 0).unwrap();
/// assert_eq!(store.read("data/demo_0/a").unwrap(), vec![7, 9]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the leading-axis length of the dataset at `path`.
    #[must_use]
    pub fn rows(&self, path: &str) -> Option<u64> {
        self.inner.read().datasets.get(path).map(|d| d.rows)
    }

    /// Returns the element type of the dataset at `path`.
    #[must_use]
    pub fn dtype(&self, path: &str) -> Option<Dtype> {
        self.inner.read().datasets.get(path).map(|d| d.dtype)
    }

    /// Returns the item shape of the dataset at `path`.
    #[must_use]
    pub fn item_shape(&self, path: &str) -> Option<Vec<u64>> {
        self.inner
            .read()
            .datasets
            .get(path)
            .map(|d| d.item_shape.clone())
    }

    /// Returns the chunk shape of the dataset at `path`, if one was fixed
    /// at creation (`None` also when chunking was delegated to the store).
    #[must_use]
    pub fn chunk_shape(&self, path: &str) -> Option<Vec<u64>> {
        self.inner
            .read()
            .datasets
            .get(path)
            .and_then(|d| d.chunk_shape.clone())
    }

    /// Returns the compression codec of the dataset at `path`.
    #[must_use]
    pub fn compression(&self, path: &str) -> Option<Compression> {
        self.inner
            .read()
            .datasets
            .get(path)
            .and_then(|d| d.compression)
    }

    /// Returns a copy of the raw bytes of the dataset at `path`.
    #[must_use]
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.read().datasets.get(path).map(|d| d.data.clone())
    }

    /// Decodes the dataset at `path` as little-endian `f64` elements.
    ///
    /// Returns `None` if the dataset is missing or not [`Dtype::F64`].
    #[must_use]
    pub fn read_f64(&self, path: &str) -> Option<Vec<f64>> {
        let inner = self.inner.read();
        let ds = inner.datasets.get(path)?;
        if ds.dtype != Dtype::F64 {
            return None;
        }
        Some(
            ds.data
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
        )
    }

    /// Decodes the dataset at `path` as little-endian `f32` elements.
    ///
    /// Returns `None` if the dataset is missing or not [`Dtype::F32`].
    #[must_use]
    pub fn read_f32(&self, path: &str) -> Option<Vec<f32>> {
        let inner = self.inner.read();
        let ds = inner.datasets.get(path)?;
        if ds.dtype != Dtype::F32 {
            return None;
        }
        Some(
            ds.data
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    /// Returns the attribute `key` of the dataset or group at `path`.
    #[must_use]
    pub fn attr(&self, path: &str, key: &str) -> Option<AttrValue> {
        let inner = self.inner.read();
        if let Some(ds) = inner.datasets.get(path) {
            return ds.attrs.get(key).cloned();
        }
        inner.groups.get(path).and_then(|a| a.get(key).cloned())
    }

    /// Returns every dataset path in the store, sorted.
    #[must_use]
    pub fn dataset_paths(&self) -> Vec<String> {
        self.inner.read().datasets.keys().cloned().collect()
    }
}

fn child_of<'a>(key: &'a str, path: &str) -> Option<&'a str> {
    let rest = if path.is_empty() {
        key
    } else {
        key.strip_prefix(path)?.strip_prefix('/')?
    };
    if rest.is_empty() || rest.contains('/') {
        None
    } else {
        Some(rest)
    }
}

impl ArrayStore for InMemoryStore {
    fn exists(&self, path: &str) -> bool {
        let inner = self.inner.read();
        inner.datasets.contains_key(path) || inner.groups.contains_key(path)
    }

    fn create_array(&mut self, path: &str, spec: ArraySpec) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if inner.datasets.contains_key(path) || inner.groups.contains_key(path) {
            return Err(StoreError::AlreadyExists {
                path: path.to_string(),
            });
        }
        let item_nbytes = spec.item_nbytes();
        if item_nbytes == 0 {
            return Err(StoreError::LayoutMismatch {
                path: path.to_string(),
                len: 0,
                item_nbytes,
            });
        }
        for (i, _) in path.match_indices('/') {
            let parent = &path[..i];
            if inner.datasets.contains_key(parent) {
                return Err(StoreError::NotAGroup {
                    path: parent.to_string(),
                });
            }
            inner.groups.entry(parent.to_string()).or_default();
        }
        let rows = spec.initial_rows;
        inner.datasets.insert(
            path.to_string(),
            Dataset {
                dtype: spec.dtype,
                item_shape: spec.item_shape,
                item_nbytes,
                rows,
                chunk_shape: spec.chunk_shape,
                compression: spec.compression,
                data: vec![0; rows as usize * item_nbytes],
                attrs: HashMap::new(),
            },
        );
        Ok(())
    }

    fn resize_rows(&mut self, path: &str, new_rows: u64) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let ds = inner
            .datasets
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })?;
        if new_rows < ds.rows {
            return Err(StoreError::InvalidResize {
                path: path.to_string(),
                from: ds.rows,
                to: new_rows,
            });
        }
        ds.data.resize(new_rows as usize * ds.item_nbytes, 0);
        ds.rows = new_rows;
        Ok(())
    }

    fn write_rows(
        &mut self,
        path: &str,
        src: &[u8],
        src_rows: Range<usize>,
        dst_row: u64,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let ds = inner
            .datasets
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })?;
        let item = ds.item_nbytes;
        if src.len() % item != 0 {
            return Err(StoreError::LayoutMismatch {
                path: path.to_string(),
                len: src.len(),
                item_nbytes: item,
            });
        }
        let src_avail = src.len() / item;
        if src_rows.start > src_rows.end || src_rows.end > src_avail {
            return Err(StoreError::OutOfBounds {
                path: path.to_string(),
                start: src_rows.start as u64,
                end: src_rows.end as u64,
                rows: src_avail as u64,
            });
        }
        let count = (src_rows.end - src_rows.start) as u64;
        if dst_row + count > ds.rows {
            return Err(StoreError::OutOfBounds {
                path: path.to_string(),
                start: dst_row,
                end: dst_row + count,
                rows: ds.rows,
            });
        }
        let src_off = src_rows.start * item;
        let dst_off = dst_row as usize * item;
        let nbytes = count as usize * item;
        ds.data[dst_off..dst_off + nbytes].copy_from_slice(&src[src_off..src_off + nbytes]);
        Ok(())
    }

    fn set_attr(&mut self, path: &str, key: &str, value: AttrValue) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if let Some(ds) = inner.datasets.get_mut(path) {
            ds.attrs.insert(key.to_string(), value);
            return Ok(());
        }
        if let Some(attrs) = inner.groups.get_mut(path) {
            attrs.insert(key.to_string(), value);
            return Ok(());
        }
        Err(StoreError::NotFound {
            path: path.to_string(),
        })
    }

    fn list_children(&self, path: &str) -> StoreResult<Vec<String>> {
        let inner = self.inner.read();
        if !path.is_empty() && !inner.groups.contains_key(path) {
            if inner.datasets.contains_key(path) {
                return Err(StoreError::NotAGroup {
                    path: path.to_string(),
                });
            }
            return Err(StoreError::NotFound {
                path: path.to_string(),
            });
        }
        let mut children: Vec<String> = inner
            .groups
            .keys()
            .chain(inner.datasets.keys())
            .filter_map(|key| child_of(key, path))
            .map(str::to_string)
            .collect();
        children.sort();
        children.dedup();
        Ok(children)
    }

    fn flush(&mut self) -> StoreResult<()> {
        // Nothing buffered beyond process memory.
        Ok(())
    }
}
