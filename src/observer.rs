use alloc::vec::Vec;

use crate::ItemKey;
use crate::key::{KeyMap, KeySet};

/// Default trailing delay before pending invalidations are drained.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 3000;

/// A node reported by the host's resize observer.
///
/// The host resolves the node to the key of its nearest item wrapper and tells whether the node
/// still belongs to the live render tree. Detached nodes (e.g. removed during a reorder) are
/// dropped by the bridge.
pub trait RenderedNode {
    type Key;

    fn item_key(&self) -> Option<Self::Key>;

    fn is_attached(&self) -> bool;
}

/// A plain resize report, for hosts that already resolved the key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResizedNode<K> {
    pub key: Option<K>,
    pub attached: bool,
}

impl<K> ResizedNode<K> {
    pub fn attached(key: K) -> Self {
        Self {
            key: Some(key),
            attached: true,
        }
    }

    pub fn detached(key: K) -> Self {
        Self {
            key: Some(key),
            attached: false,
        }
    }
}

impl<K: Clone> RenderedNode for ResizedNode<K> {
    type Key = K;

    fn item_key(&self) -> Option<K> {
        self.key.clone()
    }

    fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Observation state of a key. Keys that are not observed have no state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObservationState {
    /// Registered; the next attached callback is the initial layout, not a resize.
    InitialPending,
    Settled,
}

/// Observation changes the host must apply to its resize observer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeChange<K> {
    pub observe: Vec<K>,
    pub unobserve: Vec<K>,
}

impl<K> Default for RangeChange<K> {
    fn default() -> Self {
        Self {
            observe: Vec::new(),
            unobserve: Vec::new(),
        }
    }
}

/// Invalidations produced by one paint frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameWork<K> {
    /// Keys whose resize was observed in an earlier frame. They also joined the pending set.
    pub resized: Vec<K>,
    /// Keys drained from the pending set by the trailing timer.
    pub drained: Vec<K>,
}

impl<K> Default for FrameWork<K> {
    fn default() -> Self {
        Self {
            resized: Vec::new(),
            drained: Vec::new(),
        }
    }
}

impl<K> FrameWork<K> {
    pub fn is_empty(&self) -> bool {
        self.resized.is_empty() && self.drained.is_empty()
    }
}

/// Turns asynchronous resize notifications into batched cache invalidations.
///
/// Timing contract:
/// - A resize is never applied in the callback that reports it. It is queued and applied on the
///   next [`ResizeBridge::on_frame`].
/// - Keys invalidated by a frame ignore resize reports until the following frame starts. Reports
///   arriving in that window are discarded, not deferred: the relayout that frame requested
///   cannot feed back into the same batch, and the key's next render measures it again.
/// - Pending keys are drained once the trailing timer expires, skipping keys that are inside
///   the overscan range at that moment (their own render measures them again).
#[derive(Clone, Debug)]
pub struct ResizeBridge<K> {
    delay_ms: u64,
    observed: KeyMap<K, ObservationState>,
    queued: Vec<K>,
    pending: KeySet<K>,
    suppressed: KeySet<K>,
    deadline_ms: Option<u64>,
    overscan: KeySet<K>,
}

impl<K> Default for ResizeBridge<K> {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_DELAY_MS)
    }
}

impl<K> ResizeBridge<K> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            observed: KeyMap::new(),
            queued: Vec::new(),
            pending: KeySet::new(),
            suppressed: KeySet::new(),
            deadline_ms: None,
            overscan: KeySet::new(),
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// When the trailing timer fires, if armed.
    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn observed_len(&self) -> usize {
        self.observed.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops all observation state and cancels the timer.
    pub fn disconnect(&mut self) {
        cdebug!(
            observed = self.observed.len(),
            pending = self.pending.len(),
            "ResizeBridge::disconnect"
        );
        self.observed.clear();
        self.queued.clear();
        self.pending.clear();
        self.suppressed.clear();
        self.overscan.clear();
        self.deadline_ms = None;
    }
}

impl<K: ItemKey + Clone> ResizeBridge<K> {
    pub fn state(&self, key: &K) -> Option<ObservationState> {
        self.observed.get(key).copied()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains(key)
    }

    /// Records the keys the engine just rendered.
    ///
    /// `visible` are the keys of the rendered window, `overscan` the keys of the overscanned
    /// window (a superset). Keys entering the visible window start being observed; observed
    /// keys that left the overscan window are unmounted and stop being observed.
    pub fn on_range_rendered(
        &mut self,
        visible: impl IntoIterator<Item = K>,
        overscan: impl IntoIterator<Item = K>,
    ) -> RangeChange<K> {
        let visible: KeySet<K> = visible.into_iter().collect();
        let mut overscan: KeySet<K> = overscan.into_iter().collect();
        overscan.extend(visible.iter().cloned());

        let mut change = RangeChange::default();
        for key in &visible {
            if self.observed.contains_key(key) {
                continue;
            }
            self.observed
                .insert(key.clone(), ObservationState::InitialPending);
            change.observe.push(key.clone());
        }

        let unmounted: Vec<K> = self
            .observed
            .keys()
            .filter(|k| !overscan.contains(*k))
            .cloned()
            .collect();
        for key in unmounted {
            self.observed.remove(&key);
            change.unobserve.push(key);
        }

        ctrace!(
            visible = visible.len(),
            overscan = overscan.len(),
            observe = change.observe.len(),
            unobserve = change.unobserve.len(),
            "on_range_rendered"
        );
        self.overscan = overscan;
        change
    }

    /// Accepts one batch of resize notifications.
    ///
    /// Nothing is invalidated here; settled resizes are queued for the next frame.
    pub fn on_resize<N>(&mut self, nodes: impl IntoIterator<Item = N>)
    where
        N: RenderedNode<Key = K>,
    {
        let mut batch: Vec<K> = Vec::new();
        for node in nodes {
            if !node.is_attached() {
                ctrace!("on_resize: skipped detached node");
                continue;
            }
            let Some(key) = node.item_key() else {
                continue;
            };
            if !batch.contains(&key) {
                batch.push(key);
            }
        }

        for key in batch {
            match self.observed.get_mut(&key) {
                None => {}
                Some(state) if *state == ObservationState::InitialPending => {
                    *state = ObservationState::Settled;
                }
                Some(_) => {
                    if self.suppressed.contains(&key) || self.queued.contains(&key) {
                        continue;
                    }
                    self.queued.push(key);
                }
            }
        }
    }

    /// Re-arms the trailing timer while invalidations are pending (e.g. on scroll).
    pub fn on_scroll(&mut self, now_ms: u64) {
        if self.pending.is_empty() {
            return;
        }
        self.deadline_ms = Some(now_ms.saturating_add(self.delay_ms));
    }

    /// Runs the per-frame work.
    ///
    /// `is_live` tells whether a key is still part of the current (reconciled) sequence. Keys that
    /// are gone are forgotten instead of invalidated.
    pub fn on_frame(&mut self, now_ms: u64, is_live: impl Fn(&K) -> bool) -> FrameWork<K> {
        let mut work = FrameWork::default();
        self.suppressed.clear();

        for key in core::mem::take(&mut self.queued) {
            if !is_live(&key) {
                self.observed.remove(&key);
                continue;
            }
            self.pending.insert(key.clone());
            work.resized.push(key);
        }
        if !work.resized.is_empty() {
            self.deadline_ms = Some(now_ms.saturating_add(self.delay_ms));
        }

        if self.deadline_ms.is_some_and(|deadline| now_ms >= deadline) {
            self.deadline_ms = None;
            for key in core::mem::take(&mut self.pending) {
                if self.overscan.contains(&key) {
                    ctrace!("drain: skipped overscanned key");
                    continue;
                }
                if is_live(&key) {
                    work.drained.push(key);
                }
            }
        }

        for key in work.resized.iter().chain(work.drained.iter()) {
            self.suppressed.insert(key.clone());
        }
        if !work.is_empty() {
            cdebug!(
                resized = work.resized.len(),
                drained = work.drained.len(),
                pending = self.pending.len(),
                "on_frame"
            );
        }
        work
    }

    /// Forgets every key that is no longer part of the sequence.
    pub fn retain_live(&mut self, is_live: impl Fn(&K) -> bool) {
        self.observed.retain(|k, _| is_live(k));
        self.queued.retain(|k| is_live(k));
        self.pending.retain(|k| is_live(k));
        self.suppressed.retain(|k| is_live(k));
        if self.pending.is_empty() {
            self.deadline_ms = None;
        }
    }
}
