//! Episode identity: naming, counter recovery, and per-slot ID binding.

use crate::batch::Mask;
use crate::types::EpisodeId;

/// Top-level group holding every episode entry.
pub const DATA_GROUP: &str = "data";

/// Name prefix of an episode entry (`demo_<id>`).
pub const EPISODE_PREFIX: &str = "demo_";

/// Returns the group path of an episode (`data/demo_<id>`).
#[must_use]
pub fn episode_path(id: EpisodeId) -> String {
    format!("{DATA_GROUP}/{EPISODE_PREFIX}{}", id.as_u64())
}

/// Returns the dataset path of a field (`data/demo_<id>/<field>`).
#[must_use]
pub fn dataset_path(id: EpisodeId, field: &str) -> String {
    format!("{DATA_GROUP}/{EPISODE_PREFIX}{}/{field}", id.as_u64())
}

/// Extracts the integer index from an episode entry name.
///
/// Returns `None` for names that are not `demo_<n>`.
#[must_use]
pub fn parse_episode_index(name: &str) -> Option<u64> {
    name.strip_prefix(EPISODE_PREFIX)?.parse().ok()
}

/// Seeds the ID counter from persisted entry names.
///
/// Returns one past the largest `demo_<n>` index, or 0 when nothing
/// matches. Non-contiguous indices are fine; the counter only has to land
/// past everything already committed. Persisted entries are trusted at
/// face value - no shapes are cross-validated at startup.
///
/// # Example
///
/// ```rust
/// use epistore_core::next_id_after;
///
/// assert_eq!(next_id_after(["demo_0", "demo_17", "junk"]), 18);
/// assert_eq!(next_id_after(Vec::<String>::new()), 0);
/// ```
#[must_use]
pub fn next_id_after<I, S>(names: I) -> u64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| parse_episode_index(name.as_ref()))
        .map(|index| index + 1)
        .max()
        .unwrap_or(0)
}

/// Binds one open episode ID to every slot of a fixed-width batch.
///
/// IDs come from a process-local counter that is strictly increasing and
/// never reused. Binding is eager: every slot holds an open ID from
/// construction on, and [`rotate`](Self::rotate) retires the selected
/// slots by binding each a fresh, strictly greater ID.
#[derive(Debug)]
pub struct EpisodeManager {
    next: u64,
    bound: Vec<EpisodeId>,
}

impl EpisodeManager {
    /// Creates a manager for `width` slots, binding IDs
    /// `next, next + 1, ..` in slot order.
    #[must_use]
    pub fn new(width: usize, next: u64) -> Self {
        let mut manager = Self {
            next,
            bound: Vec::with_capacity(width),
        };
        for _ in 0..width {
            let id = manager.next_id();
            manager.bound.push(id);
        }
        manager
    }

    /// Creates a manager whose counter is seeded from persisted entry
    /// names via [`next_id_after`].
    #[must_use]
    pub fn recover<I, S>(width: usize, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(width, next_id_after(names))
    }

    fn next_id(&mut self) -> EpisodeId {
        let id = EpisodeId::new(self.next);
        self.next += 1;
        id
    }

    /// Returns the ID bound to `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    #[must_use]
    pub fn bound(&self, slot: usize) -> EpisodeId {
        self.bound[slot]
    }

    /// Returns the IDs bound to all slots, in slot order.
    #[must_use]
    pub fn ids(&self) -> &[EpisodeId] {
        &self.bound
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn width(&self) -> usize {
        self.bound.len()
    }

    /// Retires the selected slots, binding each a fresh, strictly greater
    /// ID. `None` selects every slot.
    pub fn rotate(&mut self, mask: Option<&Mask>) {
        for slot in 0..self.bound.len() {
            if mask.map_or(true, |m| m.is_active(slot)) {
                let id = self.next_id();
                self.bound[slot] = id;
            }
        }
    }
}
