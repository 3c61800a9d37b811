//! # EpiStore Core
//!
//! Buffered episodic collection engine for EpiStore.
//!
//! This crate provides:
//! - Episode identifier management: monotonic, never-reused IDs bound one
//!   per batch slot, recovered across process restarts from the persisted
//!   namespace
//! - A RAM-bounded buffered write engine ([`Collector`])
//! - The flush/commit algorithm: per-episode dataset creation and growth
//!   with consistent shape/dtype/chunking, and strictly ordered row
//!   placement
//! - Attribute buffering, applied once dataset existence is guaranteed
//!
//! Data arrives as named batches with an optional slot mask, coalesces in
//! memory, and is committed to an
//! [`ArrayStore`](epistore_storage::ArrayStore) under
//! `data/demo_<id>/<field>` when a configured byte budget is exceeded or a
//! flush/reset is requested.
//!
//! ## Example
//!
//! ```rust
//! use epistore_core::{Batch, ChunkPolicy, Collector, CollectorConfig, Mask};
//! use epistore_storage::InMemoryStore;
//!
//! let config = CollectorConfig::new(2).chunk(ChunkPolicy::bytes_spec("4KB").unwrap());
//! let mut collector = Collector::new(InMemoryStore::new(), config).unwrap();
//!
//! // one timestep for both slots
//! collector.add("reward", Batch::scalars(&[0.1f64, 0.2]), None).unwrap();
//! // retire slot 1's episode; slot 0 keeps collecting
//! collector.reset(Some(&Mask::from([false, true]))).unwrap();
//! collector.add("reward", Batch::scalars(&[0.3f64, 0.4]), None).unwrap();
//!
//! let store = collector.close().unwrap();
//! assert_eq!(store.read_f64("data/demo_0/reward").unwrap(), vec![0.1, 0.3]);
//! assert_eq!(store.read_f64("data/demo_1/reward").unwrap(), vec![0.2]);
//! assert_eq!(store.read_f64("data/demo_2/reward").unwrap(), vec![0.4]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod chunk;
mod collector;
mod config;
mod episode;
mod error;
mod size;
mod types;

pub use batch::{Batch, Element, Mask};
pub use chunk::ChunkPolicy;
pub use collector::Collector;
pub use config::CollectorConfig;
pub use episode::{
    dataset_path, episode_path, next_id_after, parse_episode_index, EpisodeManager, DATA_GROUP,
    EPISODE_PREFIX,
};
pub use error::{CoreError, CoreResult};
pub use size::SizeSpec;
pub use types::EpisodeId;
