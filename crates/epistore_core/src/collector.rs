//! Buffered collection of batched episodic data.

use crate::batch::{Batch, Mask};
use crate::chunk::ChunkPolicy;
use crate::config::CollectorConfig;
use crate::episode::{dataset_path, episode_path, next_id_after, EpisodeManager, DATA_GROUP};
use crate::error::{CoreError, CoreResult};
use crate::types::EpisodeId;
use epistore_storage::{ArraySpec, ArrayStore, AttrValue, Compression, Dtype};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

/// A buffered data record awaiting the next flush.
#[derive(Debug)]
struct PendingWrite {
    field: String,
    batch: Batch,
    mask: Option<Mask>,
}

impl PendingWrite {
    fn is_active(&self, slot: usize) -> bool {
        self.mask.as_ref().map_or(true, |m| m.is_active(slot))
    }
}

/// A buffered attribute record awaiting the next flush.
#[derive(Debug)]
struct PendingAttr {
    field: Option<String>,
    key: String,
    value: AttrValue,
    mask: Option<Mask>,
}

impl PendingAttr {
    fn selects(&self, slot: usize) -> bool {
        self.mask.as_ref().map_or(true, |m| m.is_active(slot))
    }
}

/// Item shape and element type, fixed for a field on first sight.
#[derive(Debug, Clone)]
struct FieldMeta {
    dtype: Dtype,
    item_shape: Vec<u64>,
}

impl FieldMeta {
    fn item_nbytes(&self) -> usize {
        self.item_shape.iter().product::<u64>() as usize * self.dtype.size()
    }
}

/// Buffers batched, per-episode data and commits it into an [`ArrayStore`].
///
/// The collector holds `batch_width` slots, each bound to one open episode
/// ID. Incoming records (`field`, batch, optional slot mask) coalesce in
/// memory; [`flush`](Self::flush) commits them under
/// `data/demo_<id>/<field>`, creating or growing one resizable dataset per
/// `(episode, field)` pair and replaying the buffered rows in arrival
/// order. [`reset`](Self::reset) flushes, then retires the selected slots
/// so their next rows start fresh episodes.
///
/// A configured flush threshold bounds buffered memory: when the running
/// byte estimate exceeds it, `add` flushes synchronously before returning.
///
/// Buffered data is only durable after a flush; drop without
/// [`close`](Self::close) (or a final `flush`) loses whatever is still
/// buffered.
///
/// # Example
///
/// ```rust
/// use epistore_core::{Batch, Collector, CollectorConfig, Mask};
/// use epistore_storage::InMemoryStore;
///
/// let mut collector =
///     Collector::new(InMemoryStore::new(), CollectorConfig::new(2)).unwrap();
///
/// // one timestep for both slots, then one for slot 0 alone
/// collector.add("reward", Batch::scalars(&[0.5f64, 0.7]), None).unwrap();
/// collector
///     .add("reward", Batch::scalars(&[0.9f64]), Some(Mask::from([true, false])))
///     .unwrap();
///
/// let store = collector.close().unwrap();
/// assert_eq!(store.read_f64("data/demo_0/reward").unwrap(), vec![0.5, 0.9]);
/// assert_eq!(store.read_f64("data/demo_1/reward").unwrap(), vec![0.7]);
/// ```
pub struct Collector<S: ArrayStore> {
    store: S,
    width: usize,
    chunk: ChunkPolicy,
    compression: Option<Compression>,
    flush_threshold: Option<u64>,
    episodes: EpisodeManager,
    /// Shape/dtype fixed per field on first `add`, for the collector's
    /// lifetime (the invariant spans episodes, not just one flush).
    fields: BTreeMap<String, FieldMeta>,
    /// Rows reserved in the store per dataset this collector created.
    committed: HashMap<(EpisodeId, String), u64>,
    writes: Vec<PendingWrite>,
    attrs: Vec<PendingAttr>,
    buffered_bytes: u64,
}

impl<S: ArrayStore> Collector<S> {
    /// Opens a collector over `store`.
    ///
    /// When the store already holds a `data` group, the episode counter is
    /// seeded one past the largest existing `demo_<n>` index, so episodes
    /// from prior runs are never overwritten. Every slot is bound an open
    /// episode ID immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if `config.batch_width` is zero or the existing
    /// entries cannot be listed.
    pub fn new(store: S, config: CollectorConfig) -> CoreResult<Self> {
        if config.batch_width == 0 {
            return Err(CoreError::invalid_config("batch width must be at least 1"));
        }
        let next = if store.exists(DATA_GROUP) {
            next_id_after(store.list_children(DATA_GROUP)?)
        } else {
            0
        };
        let episodes = EpisodeManager::new(config.batch_width, next);
        debug!(width = config.batch_width, first_id = next, "collector opened");
        Ok(Self {
            store,
            width: config.batch_width,
            chunk: config.chunk,
            compression: config.compression,
            flush_threshold: config.flush_threshold.as_bytes(),
            episodes,
            fields: BTreeMap::new(),
            committed: HashMap::new(),
            writes: Vec::new(),
            attrs: Vec::new(),
            buffered_bytes: 0,
        })
    }

    /// Buffers one batch of rows for `field`.
    ///
    /// Without a mask the batch must carry one row per slot. With a mask
    /// the batch carries only the active slots' rows, compacted in slot
    /// order, and the mask must cover exactly the collector width.
    ///
    /// Triggers a synchronous [`flush`](Self::flush) before returning when
    /// the buffered byte estimate exceeds the configured threshold.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BatchWidthMismatch`] /
    /// [`CoreError::MaskWidthMismatch`] on width violations,
    /// [`CoreError::ShapeMismatch`] / [`CoreError::DtypeMismatch`] when the
    /// field's item layout changes, or any error of a triggered flush.
    pub fn add(&mut self, field: &str, batch: Batch, mask: Option<Mask>) -> CoreResult<()> {
        match &mask {
            None => {
                if batch.rows() != self.width {
                    return Err(CoreError::BatchWidthMismatch {
                        field: field.to_string(),
                        expected: self.width,
                        actual: batch.rows(),
                    });
                }
            }
            Some(m) => {
                if m.len() != self.width {
                    return Err(CoreError::MaskWidthMismatch {
                        expected: self.width,
                        actual: m.len(),
                    });
                }
                if batch.rows() != m.active_count() {
                    return Err(CoreError::BatchWidthMismatch {
                        field: field.to_string(),
                        expected: m.active_count(),
                        actual: batch.rows(),
                    });
                }
            }
        }
        self.check_field(field, &batch)?;

        self.buffered_bytes +=
            batch.nbytes() as u64 + mask.as_ref().map_or(0, |m| m.nbytes() as u64);
        self.writes.push(PendingWrite {
            field: field.to_string(),
            batch,
            mask,
        });

        if let Some(budget) = self.flush_threshold {
            if self.buffered_bytes > budget {
                self.flush()?;
            }
        }
        Ok(())
    }

    /// Buffers a single item for `field`.
    ///
    /// Sugar for [`add`](Self::add) with a one-row batch and no mask;
    /// only meaningful for width-1 collectors.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BatchWidthMismatch`] if `item` does not carry
    /// exactly one row, plus everything `add` can return.
    pub fn add_single(&mut self, field: &str, item: Batch) -> CoreResult<()> {
        if item.rows() != 1 {
            return Err(CoreError::BatchWidthMismatch {
                field: field.to_string(),
                expected: 1,
                actual: item.rows(),
            });
        }
        self.add(field, item, None)
    }

    /// Buffers a scalar attribute for the episodes selected by `mask`
    /// (every slot's episode when `None`).
    ///
    /// With `field` the attribute lands on `data/demo_<id>/<field>`;
    /// without, on the episode entry `data/demo_<id>`. Attributes are
    /// applied at the next flush, after dataset existence is guaranteed -
    /// a target that still does not exist then is an error, never created
    /// silently.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MaskWidthMismatch`] if the mask does not cover
    /// the collector width.
    pub fn add_attribute(
        &mut self,
        field: Option<&str>,
        key: &str,
        value: impl Into<AttrValue>,
        mask: Option<Mask>,
    ) -> CoreResult<()> {
        if let Some(m) = &mask {
            if m.len() != self.width {
                return Err(CoreError::MaskWidthMismatch {
                    expected: self.width,
                    actual: m.len(),
                });
            }
        }
        self.attrs.push(PendingAttr {
            field: field.map(str::to_string),
            key: key.to_string(),
            value: value.into(),
            mask,
        });
        Ok(())
    }

    /// Commits everything buffered to the store and durably persists it.
    ///
    /// Buffered records replay in arrival order, so each episode/field
    /// dataset receives its rows in exactly the order they were added,
    /// independent of interleaving across fields. An empty write buffer
    /// still runs the attribute pass (attributes may reference previously
    /// committed data) and the durability barrier.
    ///
    /// On success the buffers are cleared and the byte estimate drops to
    /// zero. On error everything stays buffered and the caller must assume
    /// partial persistence: some datasets may already have been created or
    /// grown (the store offers no multi-dataset transaction), so a blind
    /// retry can commit rows twice.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingTarget`] when a buffered attribute
    /// references a dataset or episode entry that does not exist, or any
    /// store error.
    pub fn flush(&mut self) -> CoreResult<()> {
        if !self.writes.is_empty() {
            self.commit_writes()?;
        }
        self.apply_attributes()?;
        self.store.flush()?;

        self.writes.clear();
        self.attrs.clear();
        self.buffered_bytes = 0;
        Ok(())
    }

    /// Flushes, then retires the episodes of the slots selected by `mask`
    /// (every slot when `None`).
    ///
    /// The unconditional flush first means no buffered row can end up
    /// attributed to a retired ID. Retired slots are immediately bound
    /// fresh, strictly greater episode IDs.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MaskWidthMismatch`] if the mask does not cover
    /// the collector width, or any error of the flush.
    pub fn reset(&mut self, mask: Option<&Mask>) -> CoreResult<()> {
        if let Some(m) = mask {
            if m.len() != self.width {
                return Err(CoreError::MaskWidthMismatch {
                    expected: self.width,
                    actual: m.len(),
                });
            }
        }
        self.flush()?;
        self.episodes.rotate(mask);
        debug!(ids = ?self.episodes.ids(), "episodes rotated");
        Ok(())
    }

    /// Flushes and returns the store.
    ///
    /// # Errors
    ///
    /// Returns any error of the final flush.
    pub fn close(mut self) -> CoreResult<S> {
        self.flush()?;
        Ok(self.store)
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the batch width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the episode IDs currently bound to the slots, in slot
    /// order.
    #[must_use]
    pub fn episode_ids(&self) -> &[EpisodeId] {
        self.episodes.ids()
    }

    /// Returns the running byte estimate of the buffered records.
    #[must_use]
    pub fn buffered_bytes(&self) -> u64 {
        self.buffered_bytes
    }

    /// Returns the number of buffered data records.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Returns the number of buffered attribute records.
    #[must_use]
    pub fn pending_attributes(&self) -> usize {
        self.attrs.len()
    }

    fn check_field(&mut self, field: &str, batch: &Batch) -> CoreResult<()> {
        match self.fields.get(field) {
            None => {
                self.fields.insert(
                    field.to_string(),
                    FieldMeta {
                        dtype: batch.dtype(),
                        item_shape: batch.item_shape().to_vec(),
                    },
                );
                Ok(())
            }
            Some(meta) => {
                if meta.dtype != batch.dtype() {
                    return Err(CoreError::DtypeMismatch {
                        field: field.to_string(),
                        expected: meta.dtype,
                        actual: batch.dtype(),
                    });
                }
                if meta.item_shape != batch.item_shape() {
                    return Err(CoreError::ShapeMismatch {
                        field: field.to_string(),
                        expected: meta.item_shape.clone(),
                        actual: batch.item_shape().to_vec(),
                    });
                }
                Ok(())
            }
        }
    }

    fn commit_writes(&mut self) -> CoreResult<()> {
        struct Demand {
            meta: FieldMeta,
            counts: Vec<u64>,
        }

        // Per-field, per-slot row demand across the whole buffer. Field
        // metadata comes from the first buffered record of the field;
        // `check_field` already guaranteed the rest agree.
        let mut demand: BTreeMap<String, Demand> = BTreeMap::new();
        for write in &self.writes {
            let entry = demand
                .entry(write.field.clone())
                .or_insert_with(|| Demand {
                    meta: FieldMeta {
                        dtype: write.batch.dtype(),
                        item_shape: write.batch.item_shape().to_vec(),
                    },
                    counts: vec![0; self.width],
                });
            for (slot, count) in entry.counts.iter_mut().enumerate() {
                if write.is_active(slot) {
                    *count += 1;
                }
            }
        }

        // Create or grow every dataset that receives rows, remembering
        // each dataset's starting write offset.
        let mut offsets: HashMap<(usize, String), u64> = HashMap::new();
        for (field, dem) in &demand {
            let item_nbytes = dem.meta.item_nbytes();
            for (slot, &need) in dem.counts.iter().enumerate() {
                if need == 0 {
                    continue;
                }
                let id = self.episodes.bound(slot);
                let path = dataset_path(id, field);
                let key = (id, field.clone());
                match self.committed.get(&key).copied() {
                    None => {
                        self.store.create_array(
                            &path,
                            ArraySpec {
                                initial_rows: need,
                                item_shape: dem.meta.item_shape.clone(),
                                dtype: dem.meta.dtype,
                                chunk_shape: self
                                    .chunk
                                    .chunk_shape(&dem.meta.item_shape, item_nbytes),
                                compression: self.compression,
                            },
                        )?;
                        offsets.insert((slot, field.clone()), 0);
                        self.committed.insert(key, need);
                    }
                    Some(len) => {
                        self.store.resize_rows(&path, len + need)?;
                        offsets.insert((slot, field.clone()), len);
                        self.committed.insert(key, len + need);
                    }
                }
            }
        }

        // Replay in arrival order. With no mask the source row index
        // equals the slot; with a mask the batch carries only the active
        // rows, compacted in slot order.
        for write in &self.writes {
            let mut src_row = 0;
            for slot in 0..self.width {
                if !write.is_active(slot) {
                    continue;
                }
                let path = dataset_path(self.episodes.bound(slot), &write.field);
                if let Some(offset) = offsets.get_mut(&(slot, write.field.clone())) {
                    self.store
                        .write_rows(&path, write.batch.as_bytes(), src_row..src_row + 1, *offset)?;
                    *offset += 1;
                }
                src_row += 1;
            }
        }

        let rows: u64 = demand.values().map(|d| d.counts.iter().sum::<u64>()).sum();
        debug!(
            fields = demand.len(),
            rows,
            bytes = self.buffered_bytes,
            "flush committed"
        );
        Ok(())
    }

    fn apply_attributes(&mut self) -> CoreResult<()> {
        for attr in &self.attrs {
            for slot in 0..self.width {
                if !attr.selects(slot) {
                    continue;
                }
                let id = self.episodes.bound(slot);
                let path = match &attr.field {
                    Some(field) => dataset_path(id, field),
                    None => episode_path(id),
                };
                if !self.store.exists(&path) {
                    return Err(CoreError::missing_target(path));
                }
                self.store.set_attr(&path, &attr.key, attr.value.clone())?;
            }
        }
        Ok(())
    }
}

impl<S: ArrayStore> fmt::Debug for Collector<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("width", &self.width)
            .field("episode_ids", &self.episodes.ids())
            .field("pending_writes", &self.writes.len())
            .field("pending_attributes", &self.attrs.len())
            .field("buffered_bytes", &self.buffered_bytes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::SizeSpec;
    use epistore_storage::InMemoryStore;
    use std::collections::BTreeMap;

    fn collector(width: usize) -> Collector<InMemoryStore> {
        Collector::new(InMemoryStore::new(), CollectorConfig::new(width)).unwrap()
    }

    fn ids_of(collector: &Collector<InMemoryStore>) -> Vec<u64> {
        collector.episode_ids().iter().map(|id| id.as_u64()).collect()
    }

    #[test]
    fn fresh_collector_binds_sequential_ids() {
        let c = collector(2);
        assert_eq!(ids_of(&c), vec![0, 1]);
    }

    #[test]
    fn zero_width_rejected() {
        let result = Collector::new(InMemoryStore::new(), CollectorConfig::new(0));
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn add_then_flush_creates_datasets() {
        let mut c = collector(2);
        c.add("a", Batch::scalars(&[1.0f64, 2.0]), None).unwrap();
        c.flush().unwrap();

        let store = c.store();
        assert_eq!(store.read_f64("data/demo_0/a").unwrap(), vec![1.0]);
        assert_eq!(store.read_f64("data/demo_1/a").unwrap(), vec![2.0]);
    }

    #[test]
    fn successive_adds_append_in_order() {
        let mut c = collector(1);
        for t in 0..5 {
            c.add("a", Batch::scalars(&[f64::from(t)]), None).unwrap();
        }
        c.flush().unwrap();
        assert_eq!(
            c.store().read_f64("data/demo_0/a").unwrap(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn order_preserved_across_flushes() {
        let mut c = collector(1);
        c.add("a", Batch::scalars(&[0.0f64]), None).unwrap();
        c.flush().unwrap();
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        c.flush().unwrap();
        assert_eq!(c.store().read_f64("data/demo_0/a").unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn interleaved_fields_keep_per_field_order() {
        let mut c = collector(1);
        c.add("a", Batch::scalars(&[0.0f64]), None).unwrap();
        c.add("b", Batch::scalars(&[10.0f64]), None).unwrap();
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        c.add("b", Batch::scalars(&[11.0f64]), None).unwrap();
        c.flush().unwrap();

        assert_eq!(c.store().read_f64("data/demo_0/a").unwrap(), vec![0.0, 1.0]);
        assert_eq!(c.store().read_f64("data/demo_0/b").unwrap(), vec![10.0, 11.0]);
    }

    #[test]
    fn mask_only_extends_active_slots() {
        let mut c = collector(2);
        c.add("a", Batch::scalars(&[1.0f64, 2.0]), None).unwrap();
        c.add("a", Batch::scalars(&[3.0f64]), Some(Mask::from([true, false])))
            .unwrap();
        c.flush().unwrap();

        assert_eq!(c.store().read_f64("data/demo_0/a").unwrap(), vec![1.0, 3.0]);
        assert_eq!(c.store().read_f64("data/demo_1/a").unwrap(), vec![2.0]);
    }

    #[test]
    fn batch_width_mismatch_rejected() {
        let mut c = collector(2);
        let result = c.add("a", Batch::scalars(&[1.0f64]), None);
        assert!(matches!(result, Err(CoreError::BatchWidthMismatch { .. })));
    }

    #[test]
    fn mask_width_mismatch_rejected() {
        let mut c = collector(2);
        let result = c.add(
            "a",
            Batch::scalars(&[1.0f64]),
            Some(Mask::from([true, false, false])),
        );
        assert!(matches!(result, Err(CoreError::MaskWidthMismatch { .. })));
    }

    #[test]
    fn masked_row_count_mismatch_rejected() {
        let mut c = collector(2);
        let result = c.add(
            "a",
            Batch::scalars(&[1.0f64, 2.0]),
            Some(Mask::from([true, false])),
        );
        assert!(matches!(result, Err(CoreError::BatchWidthMismatch { .. })));
    }

    #[test]
    fn shape_mismatch_rejected() {
        let mut c = collector(1);
        c.add("b", Batch::new(1, vec![2], &[1.0f64, 2.0]).unwrap(), None)
            .unwrap();
        let result = c.add("b", Batch::new(1, vec![3], &[1.0f64, 2.0, 3.0]).unwrap(), None);
        assert!(matches!(result, Err(CoreError::ShapeMismatch { .. })));
    }

    #[test]
    fn dtype_mismatch_rejected() {
        let mut c = collector(1);
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        let result = c.add("a", Batch::scalars(&[1.0f32]), None);
        assert!(matches!(result, Err(CoreError::DtypeMismatch { .. })));
    }

    #[test]
    fn field_layout_enforced_across_flushes() {
        let mut c = collector(1);
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        c.flush().unwrap();
        let result = c.add("a", Batch::scalars(&[1.0f32]), None);
        assert!(matches!(result, Err(CoreError::DtypeMismatch { .. })));
    }

    #[test]
    fn flush_clears_buffers() {
        let mut c = collector(1);
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        assert_eq!(c.pending_writes(), 1);
        assert!(c.buffered_bytes() > 0);

        c.flush().unwrap();
        assert_eq!(c.pending_writes(), 0);
        assert_eq!(c.buffered_bytes(), 0);

        // flushing again with nothing buffered is a no-op for data
        c.flush().unwrap();
        assert_eq!(c.store().rows("data/demo_0/a"), Some(1));
    }

    #[test]
    fn mask_bytes_counted_in_estimate() {
        let mut c = collector(2);
        c.add("a", Batch::scalars(&[1.0f64]), Some(Mask::from([true, false])))
            .unwrap();
        // 8 bytes of data + 2 mask bytes
        assert_eq!(c.buffered_bytes(), 10);
    }

    #[test]
    fn threshold_triggers_flush_inside_add() {
        let config = CollectorConfig::new(1).flush_threshold(SizeSpec::Bytes(15));
        let mut c = Collector::new(InMemoryStore::new(), config).unwrap();

        c.add("a", Batch::scalars(&[0.0f64]), None).unwrap();
        assert_eq!(c.pending_writes(), 1);

        // 16 buffered bytes exceed the 15-byte budget
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        assert_eq!(c.pending_writes(), 0);
        assert_eq!(c.buffered_bytes(), 0);
        assert_eq!(c.store().read_f64("data/demo_0/a").unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn add_single_wraps_one_row() {
        let mut c = collector(1);
        c.add_single("a", Batch::scalars(&[5.0f64])).unwrap();
        c.flush().unwrap();
        assert_eq!(c.store().read_f64("data/demo_0/a").unwrap(), vec![5.0]);
    }

    #[test]
    fn add_single_rejects_wider_batches() {
        let mut c = collector(1);
        let result = c.add_single("a", Batch::scalars(&[1.0f64, 2.0]));
        assert!(matches!(result, Err(CoreError::BatchWidthMismatch { .. })));
    }

    #[test]
    fn attributes_apply_at_flush() {
        let mut c = collector(1);
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        c.add_attribute(Some("a"), "unit", "meters", None).unwrap();
        c.flush().unwrap();

        assert_eq!(
            c.store().attr("data/demo_0/a", "unit"),
            Some(AttrValue::Str("meters".to_string()))
        );
        assert_eq!(c.pending_attributes(), 0);
    }

    #[test]
    fn attribute_on_episode_entry() {
        let mut c = collector(1);
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        c.add_attribute(None, "task", "pick", None).unwrap();
        c.flush().unwrap();

        assert_eq!(
            c.store().attr("data/demo_0", "task"),
            Some(AttrValue::Str("pick".to_string()))
        );
    }

    #[test]
    fn empty_flush_still_applies_attributes() {
        let mut c = collector(1);
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        c.flush().unwrap();

        c.add_attribute(Some("a"), "steps", 1i64, None).unwrap();
        c.flush().unwrap();
        assert_eq!(c.store().attr("data/demo_0/a", "steps"), Some(AttrValue::Int(1)));
    }

    #[test]
    fn attributes_respect_mask() {
        let mut c = collector(2);
        c.add("a", Batch::scalars(&[1.0f64, 2.0]), None).unwrap();
        c.add_attribute(None, "ok", true, Some(Mask::from([false, true])))
            .unwrap();
        c.flush().unwrap();

        assert_eq!(c.store().attr("data/demo_0", "ok"), None);
        assert_eq!(c.store().attr("data/demo_1", "ok"), Some(AttrValue::Bool(true)));
    }

    #[test]
    fn attribute_missing_target_fails() {
        let mut c = collector(1);
        c.add_attribute(Some("never_written"), "unit", "m", None)
            .unwrap();
        let result = c.flush();
        assert!(matches!(result, Err(CoreError::MissingTarget { .. })));
        // the failed attribute stays buffered; the caller decides
        assert_eq!(c.pending_attributes(), 1);
    }

    #[test]
    fn attribute_mask_width_rejected() {
        let mut c = collector(2);
        let result = c.add_attribute(None, "k", 1i64, Some(Mask::from([true])));
        assert!(matches!(result, Err(CoreError::MaskWidthMismatch { .. })));
    }

    #[test]
    fn reset_rotates_all_slots() {
        let mut c = collector(2);
        c.reset(None).unwrap();
        assert_eq!(ids_of(&c), vec![2, 3]);
        c.reset(None).unwrap();
        assert_eq!(ids_of(&c), vec![4, 5]);
    }

    #[test]
    fn reset_flushes_before_rotating() {
        let mut c = collector(1);
        c.add("a", Batch::scalars(&[7.0f64]), None).unwrap();
        c.reset(None).unwrap();

        // the buffered row landed in the retired episode, not the new one
        assert_eq!(c.store().read_f64("data/demo_0/a").unwrap(), vec![7.0]);
        assert_eq!(ids_of(&c), vec![1]);
    }

    #[test]
    fn reset_mask_width_rejected() {
        let mut c = collector(2);
        let result = c.reset(Some(&Mask::from([true])));
        assert!(matches!(result, Err(CoreError::MaskWidthMismatch { .. })));
    }

    #[test]
    fn recovery_continues_past_existing_episodes() {
        let mut c = collector(1);
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        let store = c.close().unwrap();

        let c2 = Collector::new(store, CollectorConfig::new(1)).unwrap();
        assert_eq!(ids_of(&c2), vec![1]);
    }

    #[test]
    fn chunk_policy_applied_at_creation() {
        let config = CollectorConfig::new(1).chunk(ChunkPolicy::bytes_spec("4KB").unwrap());
        let mut c = Collector::new(InMemoryStore::new(), config).unwrap();
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        c.add("b", Batch::new(1, vec![100], &[0.0f64; 100]).unwrap(), None)
            .unwrap();
        c.flush().unwrap();

        // 4096 / 8 = 512 scalar rows; 4096 / 800 = 5 vector rows
        assert_eq!(c.store().chunk_shape("data/demo_0/a"), Some(vec![512]));
        assert_eq!(c.store().chunk_shape("data/demo_0/b"), Some(vec![5, 100]));
    }

    #[test]
    fn compression_recorded_at_creation() {
        let config = CollectorConfig::new(1).compression(epistore_storage::Compression::Lzf);
        let mut c = Collector::new(InMemoryStore::new(), config).unwrap();
        c.add("a", Batch::scalars(&[1.0f64]), None).unwrap();
        c.flush().unwrap();
        assert_eq!(
            c.store().compression("data/demo_0/a"),
            Some(epistore_storage::Compression::Lzf)
        );
    }

    /// One timestep for the active slots: field `a` gets a scalar, field
    /// `b` a 100-vector filled with the same value. Every value encodes
    /// `episode * 1000 + t`, recorded in `expected` for readback checks.
    fn feed(
        c: &mut Collector<InMemoryStore>,
        expected: &mut BTreeMap<u64, Vec<f64>>,
        mask: Option<&[bool]>,
    ) {
        let ids: Vec<u64> = c.episode_ids().iter().map(|id| id.as_u64()).collect();
        let mut a = Vec::new();
        let mut b = Vec::new();
        let mut rows = 0;
        for (slot, &episode) in ids.iter().enumerate() {
            if !mask.map_or(true, |m| m[slot]) {
                continue;
            }
            let series = expected.entry(episode).or_default();
            let value = episode as f64 * 1000.0 + series.len() as f64;
            series.push(value);
            a.push(value);
            b.extend(std::iter::repeat(value).take(100));
            rows += 1;
        }
        let mask = mask.map(|m| Mask::from(m.to_vec()));
        c.add("a", Batch::scalars(&a), mask.clone()).unwrap();
        c.add("b", Batch::new(rows, vec![100], &b).unwrap(), mask)
            .unwrap();
    }

    #[test]
    fn end_to_end_partial_resets() {
        let config = CollectorConfig::new(2).chunk(ChunkPolicy::bytes_spec("4KB").unwrap());
        let mut c = Collector::new(InMemoryStore::new(), config).unwrap();
        let mut expected: BTreeMap<u64, Vec<f64>> = BTreeMap::new();

        for _ in 0..99 {
            feed(&mut c, &mut expected, None);
        }
        c.reset(Some(&Mask::from([false, true]))).unwrap();
        assert_eq!(ids_of(&c), vec![0, 2]);

        feed(&mut c, &mut expected, None);
        c.reset(Some(&Mask::from([true, false]))).unwrap();
        assert_eq!(ids_of(&c), vec![3, 2]);

        feed(&mut c, &mut expected, Some(&[true, false]));
        for _ in 0..100 {
            feed(&mut c, &mut expected, None);
        }
        c.reset(Some(&Mask::from([false, true]))).unwrap();
        assert_eq!(ids_of(&c), vec![3, 4]);

        feed(&mut c, &mut expected, Some(&[true, false]));
        c.reset(None).unwrap();

        let store = c.close().unwrap();
        for (episode, lengths) in [(0u64, 100u64), (1, 99), (2, 101), (3, 102)] {
            assert_eq!(store.rows(&format!("data/demo_{episode}/a")), Some(lengths));
            assert_eq!(store.rows(&format!("data/demo_{episode}/b")), Some(lengths));
            assert_eq!(
                store.item_shape(&format!("data/demo_{episode}/b")),
                Some(vec![100])
            );
        }
        // episode 4 was bound but never fed
        assert!(!store.exists("data/demo_4"));

        // element order equals write order, per episode
        for (episode, series) in &expected {
            assert_eq!(
                store.read_f64(&format!("data/demo_{episode}/a")).unwrap(),
                *series
            );
        }
    }
}
