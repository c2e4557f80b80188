use alloc::vec::Vec;

use crate::ItemKey;
use crate::key::KeyMap;

/// Key → index lookup for one snapshot of the item sequence.
///
/// Keys are expected to be unique. If a key repeats, lookups resolve to its first occurrence.
#[derive(Clone, Debug)]
pub struct IdentityRegistry<K> {
    keys: Vec<K>,
    index: KeyMap<K, usize>,
}

impl<K> Default for IdentityRegistry<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            index: KeyMap::new(),
        }
    }
}

impl<K: ItemKey + Clone> IdentityRegistry<K> {
    pub fn from_keys(keys: impl IntoIterator<Item = K>) -> Self {
        let keys: Vec<K> = keys.into_iter().collect();
        let mut index = KeyMap::new();
        for (i, key) in keys.iter().enumerate() {
            index.entry(key.clone()).or_insert(i);
        }
        if index.len() != keys.len() {
            cwarn!(
                keys = keys.len(),
                unique = index.len(),
                "duplicate item keys in sequence"
            );
        }
        Self { keys, index }
    }
}

impl<K: ItemKey> IdentityRegistry<K> {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn key_at(&self, index: usize) -> Option<&K> {
        self.keys.get(index)
    }

    /// Keys in sequence order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Returns `true` when `other` lists the same keys in the same order.
    pub fn same_order<'a>(&self, other: impl IntoIterator<Item = &'a K>) -> bool
    where
        K: 'a,
    {
        let mut other = other.into_iter();
        for key in &self.keys {
            match other.next() {
                Some(k) if k == key => {}
                _ => return false,
            }
        }
        other.next().is_none()
    }
}
