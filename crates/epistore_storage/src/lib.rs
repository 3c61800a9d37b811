//! # EpiStore Storage
//!
//! Array store contract and implementations for EpiStore.
//!
//! This crate provides the lowest-level storage abstraction for EpiStore:
//! a hierarchical namespace of groups and chunked, resizable arrays,
//! addressed by slash-separated paths. The collection engine drives this
//! contract; it never interprets how a backend lays bytes out on disk.
//!
//! ## Design Principles
//!
//! - Stores hold **opaque row bytes** - element encoding is fixed
//!   (little-endian) and trailing item shapes never change after creation
//! - Arrays grow along the leading axis only; rows are written once and
//!   never moved
//! - Chunking and compression are recorded at creation and left to the
//!   backend
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral collection
//!
//! ## Example
//!
//! ```rust
//! use epistore_storage::{ArraySpec, ArrayStore, Dtype, InMemoryStore};
//!
//! let mut store = InMemoryStore::new();
//! store
//!     .create_array(
//!         "data/demo_0/reward",
//!         ArraySpec {
//!             initial_rows: 1,
//!             item_shape: vec![],
//!             dtype: Dtype::F64,
//!             chunk_shape: None,
//!             compression: None,
//!         },
//!     )
//!     .unwrap();
//! assert!(store.exists("data/demo_0/reward"));
//! assert_eq!(store.list_children("data").unwrap(), vec!["demo_0"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod array;
mod error;
mod memory;
mod store;

pub use array::{ArraySpec, AttrValue, Compression, Dtype};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use store::ArrayStore;
