use alloc::format;
use alloc::vec::Vec;

use crate::{
    CacheError, IdentityRegistry, ItemKey, MeasurementCache, MeasurementEntry, Position, Relayout,
    Sentinel, Slot,
};

/// Target of an explicit cache invalidation.
///
/// When both fields are set, `index` is tried first and `key` is the fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateTarget<K> {
    pub key: Option<K>,
    pub index: Option<usize>,
}

impl<K> UpdateTarget<K> {
    pub fn by_key(key: K) -> Self {
        Self {
            key: Some(key),
            index: None,
        }
    }

    pub fn by_index(index: usize) -> Self {
        Self {
            key: None,
            index: Some(index),
        }
    }

    pub fn with_key(mut self, key: K) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// Outcome of one reconciliation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Keys that disappeared from the sequence.
    pub removed: usize,
    /// Keys whose slot changed (measured or not).
    pub moved: usize,
    /// Measurements actually carried to a new slot.
    pub migrated: usize,
    pub relayout: Relayout,
}

/// Keeps cached measurements attached to item identities across sequence changes.
///
/// The reconciler owns the key order seen in the previous pass and diffs every new order
/// against it. Measurements follow their key; slots of deleted keys fall back to the
/// placeholder.
#[derive(Clone, Debug)]
pub struct Reconciler<K> {
    current: IdentityRegistry<K>,
    sentinel: Sentinel,
    initialized: bool,
}

impl<K> Default for Reconciler<K> {
    fn default() -> Self {
        Self {
            current: IdentityRegistry::default(),
            sentinel: Sentinel::None,
            initialized: false,
        }
    }
}

impl<K: ItemKey + Clone> Reconciler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs `keys` against the previous pass and migrates `cache` accordingly.
    ///
    /// The first pass only records the baseline. Passes with an unchanged key order and sentinel
    /// placement do nothing.
    pub fn reconcile(
        &mut self,
        cache: &mut MeasurementCache,
        keys: impl IntoIterator<Item = K>,
        sentinel: Sentinel,
    ) -> ReconcileReport {
        let next = IdentityRegistry::from_keys(keys);

        if !self.initialized {
            cdebug!(count = next.len(), "reconcile: baseline");
            self.current = next;
            self.sentinel = sentinel;
            self.initialized = true;
            return ReconcileReport::default();
        }

        if self.sentinel == sentinel && self.current.same_order(next.keys()) {
            return ReconcileReport::default();
        }

        let prior_offset = self.sentinel.item_offset();
        let next_offset = sentinel.item_offset();

        let mut report = ReconcileReport::default();
        let mut cleared: Vec<Position> = Vec::new();
        let mut migrations: Vec<(Position, MeasurementEntry)> = Vec::new();

        // Snapshot every source before touching the cache: with cyclic moves a target slot is
        // also another key's source.
        for (prior_index, key) in self.current.keys().iter().enumerate() {
            let from = cache.position_of(prior_index + prior_offset);
            let Some(next_index) = next.index_of(key) else {
                cleared.push(from);
                report.removed += 1;
                continue;
            };
            let to = cache.position_of(next_index + next_offset);
            if to == from {
                continue;
            }
            report.moved += 1;
            let entry = cache.entry(from);
            cleared.push(from);
            if !entry.is_placeholder() {
                migrations.push((to, entry));
            }
        }

        // The loader slot never carries a measurement over to whatever lands there next.
        if let Some(slot) = self.sentinel.slot_index(self.current.len()) {
            cleared.push(cache.position_of(slot));
        }

        for &position in &cleared {
            cache.clear(position);
        }

        let mut changed = cleared;
        for (to, entry) in migrations {
            // Colliding targets: the last write wins.
            cache.put(to, entry);
            changed.push(to);
            report.migrated += 1;
        }

        changed.sort_unstable();
        changed.dedup();
        if !changed.is_empty() {
            report.relayout = Relayout::Positions(changed);
        }

        cdebug!(
            prior = self.current.len(),
            next = next.len(),
            removed = report.removed,
            moved = report.moved,
            migrated = report.migrated,
            "reconcile"
        );

        self.current = next;
        self.sentinel = sentinel;
        report
    }

    /// Resolves `target` against the current sequence and resets its slot to the placeholder.
    ///
    /// Returns the cleared position. Fails with [`CacheError::ItemNotFound`] without touching
    /// the cache when neither the index nor the key resolves.
    pub fn update_cache(
        &self,
        cache: &mut MeasurementCache,
        target: &UpdateTarget<K>,
    ) -> Result<Position, CacheError>
    where
        K: core::fmt::Debug,
    {
        let item_index = self.resolve(target)?;
        let position = cache.position_of(item_index + self.sentinel.item_offset());
        ctrace!(
            item_index,
            row = position.row,
            column = position.column,
            "update_cache"
        );
        cache.clear(position);
        Ok(position)
    }

    /// Resolves `target` to an item index in the current sequence.
    pub fn resolve(&self, target: &UpdateTarget<K>) -> Result<usize, CacheError>
    where
        K: core::fmt::Debug,
    {
        let by_index = target.index.filter(|&i| i < self.current.len());
        let by_key = || target.key.as_ref().and_then(|k| self.current.index_of(k));
        by_index
            .or_else(by_key)
            .ok_or_else(|| CacheError::ItemNotFound {
                key: target.key.as_ref().map(|k| format!("{k:?}")),
                index: target.index,
            })
    }
}

impl<K: ItemKey> Reconciler<K> {
    pub fn registry(&self) -> &IdentityRegistry<K> {
        &self.current
    }

    pub fn sentinel(&self) -> Sentinel {
        self.sentinel
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn item_count(&self) -> usize {
        self.current.len()
    }

    /// Number of slots the engine renders (items plus the sentinel, if any).
    pub fn slot_count(&self) -> usize {
        self.sentinel.slot_count(self.current.len())
    }

    pub fn slot(&self, slot_index: usize) -> Option<Slot<'_, K>> {
        if self.sentinel.slot_index(self.current.len()) == Some(slot_index) {
            return Some(Slot::Sentinel);
        }
        let index = slot_index.checked_sub(self.sentinel.item_offset())?;
        let key = self.current.key_at(index)?;
        Some(Slot::Item { key, index })
    }

    pub fn key_at_slot(&self, slot_index: usize) -> Option<&K> {
        match self.slot(slot_index)? {
            Slot::Item { key, .. } => Some(key),
            Slot::Sentinel => None,
        }
    }

    pub fn slot_of_key(&self, key: &K) -> Option<usize> {
        self.current
            .index_of(key)
            .map(|i| i + self.sentinel.item_offset())
    }

    /// Forgets the baseline; the next pass starts over.
    pub fn reset(&mut self) {
        self.current = IdentityRegistry::default();
        self.sentinel = Sentinel::None;
        self.initialized = false;
    }
}
