#[cfg(not(feature = "std"))]
use alloc::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "std")]
use std::collections::{HashMap, HashSet};

#[cfg(feature = "std")]
pub(crate) type KeyMap<K, V> = HashMap<K, V>;
#[cfg(not(feature = "std"))]
pub(crate) type KeyMap<K, V> = BTreeMap<K, V>;

#[cfg(feature = "std")]
pub(crate) type KeySet<K> = HashSet<K>;
#[cfg(not(feature = "std"))]
pub(crate) type KeySet<K> = BTreeSet<K>;

/// Bound for application-supplied item identities.
///
/// With `std` this is `Hash + Eq`; without it keys are stored in B-trees and must be `Ord`.
#[cfg(feature = "std")]
pub trait ItemKey: core::hash::Hash + Eq {}
#[cfg(feature = "std")]
impl<K: core::hash::Hash + Eq> ItemKey for K {}

#[cfg(not(feature = "std"))]
pub trait ItemKey: Ord {}
#[cfg(not(feature = "std"))]
impl<K: Ord> ItemKey for K {}
