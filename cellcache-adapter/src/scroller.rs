use std::cell::RefCell;
use std::rc::Rc;

use cellcache::{
    LoadTicket, LoaderState, MeasurementCache, OverscanIndices, Pagination, Position,
    ReconcileReport, Reconciler, Relayout, RenderedNode, RenderedRange, ResizeBridge, Sentinel,
    Size, Slot, UpdateTarget, overscan_indices,
};

use crate::{
    InfiniteScroll, LayoutTree, LoadTask, NodeId, ResizeObserver, ScrollParentCache,
    ScrollerError, ScrollerKey, ScrollerOptions, VirtualizationEngine,
};

/// A framework-neutral scroller that keeps a [`MeasurementCache`] consistent with a keyed,
/// changing sequence and drives a virtualization engine.
///
/// This type holds no UI objects and no clock. Adapters drive it by calling:
/// - `sync_items` whenever the key order changes
/// - `measure` for each slot the engine measured during a render pass
/// - `on_range_rendered` after each render pass
/// - `on_resize` / `on_scroll` when the resize observer or the scroll container fire
/// - `on_frame(now_ms)` once per paint frame
/// - `on_sentinel_visibility` when the loader slot enters or leaves the viewport
///
/// Dropping the scroller stops resize observation and abandons in-flight loads.
pub struct Scroller<K, E: VirtualizationEngine> {
    engine: E,
    options: ScrollerOptions,
    cache: MeasurementCache,
    reconciler: Reconciler<K>,
    bridge: ResizeBridge<K>,
    pagination: Rc<RefCell<Pagination>>,
    observer: Option<Box<dyn ResizeObserver<K>>>,
    scroll_parents: ScrollParentCache,
    rendered: Option<RenderedRange>,
    anchored_to_end: bool,
}

impl<K: ScrollerKey, E: VirtualizationEngine> Scroller<K, E> {
    pub fn new(engine: E, options: ScrollerOptions) -> Result<Self, ScrollerError> {
        let cache = MeasurementCache::new(options.cache_options()?)?;
        let has_more = options
            .infinite_scroll
            .as_ref()
            .is_some_and(|infinite| infinite.has_more);
        sdebug!(
            column_count = options.column_count,
            paginated = options.infinite_scroll.is_some(),
            has_more,
            "Scroller::new"
        );
        Ok(Self {
            engine,
            bridge: ResizeBridge::new(options.batch_delay_ms),
            options,
            cache,
            reconciler: Reconciler::new(),
            pagination: Rc::new(RefCell::new(Pagination::new(has_more))),
            observer: None,
            scroll_parents: ScrollParentCache::new(),
            rendered: None,
            anchored_to_end: false,
        })
    }

    pub fn with_resize_observer(mut self, observer: impl ResizeObserver<K> + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn with_scroll_parents(mut self, scroll_parents: ScrollParentCache) -> Self {
        self.scroll_parents = scroll_parents;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn options(&self) -> &ScrollerOptions {
        &self.options
    }

    pub fn cache(&self) -> &MeasurementCache {
        &self.cache
    }

    pub fn reconciler(&self) -> &Reconciler<K> {
        &self.reconciler
    }

    pub fn bridge(&self) -> &ResizeBridge<K> {
        &self.bridge
    }

    /// The last range reported by the engine.
    pub fn rendered_range(&self) -> Option<RenderedRange> {
        self.rendered
    }

    /// Where the loader slot currently sits.
    pub fn sentinel(&self) -> Sentinel {
        match &self.options.infinite_scroll {
            Some(infinite) if self.pagination.borrow().has_more() => {
                if infinite.scroll_reverse {
                    Sentinel::Leading
                } else {
                    Sentinel::Trailing
                }
            }
            _ => Sentinel::None,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.reconciler.slot_count()
    }

    pub fn slot(&self, slot_index: usize) -> Option<Slot<'_, K>> {
        self.reconciler.slot(slot_index)
    }

    pub fn row_count(&self) -> usize {
        self.slot_count()
            .div_ceil(self.cache.column_count().get())
    }

    pub fn row_height(&self, row: usize) -> f32 {
        self.cache.row_height(row)
    }

    pub fn column_width(&self, column: usize) -> f32 {
        self.cache.column_width(column)
    }

    pub fn cell_size(&self, slot_index: usize) -> Size {
        self.cache.get(self.cache.position_of(slot_index))
    }

    /// Overscan bounds for a visible slot window, using the configured overscan count.
    pub fn overscan_indices(&self, start_index: usize, stop_index: usize) -> Option<OverscanIndices> {
        overscan_indices(
            start_index,
            stop_index,
            self.options.overscan_count,
            self.slot_count(),
        )
    }

    pub fn loader_state(&self) -> LoaderState {
        self.pagination.borrow().state()
    }

    pub fn infinite_scroll(&self) -> Option<&InfiniteScroll> {
        self.options.infinite_scroll.as_ref()
    }

    /// Pushes the current key order.
    ///
    /// Measurements follow their keys, slots of deleted keys fall back to the placeholder and
    /// the engine is asked to relayout what changed. In reverse mode the first call with a
    /// non-empty sequence scrolls the engine to the last slot.
    pub fn sync_items(&mut self, keys: impl IntoIterator<Item = K>) -> ReconcileReport {
        let sentinel = self.sentinel();
        let report = self.reconciler.reconcile(&mut self.cache, keys, sentinel);

        let registry = self.reconciler.registry();
        self.bridge.retain_live(|k| registry.contains(k));
        self.relayout(report.relayout.clone());

        let reverse = self
            .options
            .infinite_scroll
            .as_ref()
            .is_some_and(|infinite| infinite.scroll_reverse);
        if reverse && !self.anchored_to_end {
            if let Some(last) = self.slot_count().checked_sub(1) {
                sdebug!(last, "reverse mount: scroll to end");
                self.engine.scroll_to_index(last);
                self.anchored_to_end = true;
            }
        }
        report
    }

    /// Invalidates one item by index (tried first) or key and relayouts its slot.
    pub fn update_cache(&mut self, target: UpdateTarget<K>) -> Result<Position, ScrollerError> {
        let position = self.reconciler.update_cache(&mut self.cache, &target)?;
        self.relayout(Relayout::Positions(vec![position]));
        Ok(position)
    }

    /// Records the size the engine measured for a slot.
    ///
    /// An invalid measurement is logged and the slot falls back to the placeholder. Returns
    /// whether the stored size changed; changed slots are relayouted.
    pub fn measure(&mut self, slot_index: usize, width: f32, height: f32) -> bool {
        let position = self.cache.position_of(slot_index);
        let before = self.cache.entry(position);
        if self.cache.set(position, width, height).is_err() {
            swarn!(slot_index, width, height, "measure: falling back to placeholder");
            self.cache.clear(position);
        }
        let changed = self.cache.entry(position) != before;
        if changed {
            self.relayout(Relayout::Positions(vec![position]));
        }
        changed
    }

    /// Handles the engine's report of one render pass.
    ///
    /// Items entering the visible window start being observed; items that left the overscan
    /// window stop being observed.
    pub fn on_range_rendered(&mut self, range: RenderedRange) {
        let visible = self.keys_in(range.start_index, range.stop_index);
        let overscan = self.keys_in(range.overscan_start_index, range.overscan_stop_index);
        let change = self.bridge.on_range_rendered(visible, overscan);
        self.rendered = Some(range);

        let Some(observer) = self.observer.as_mut() else {
            return;
        };
        for key in &change.unobserve {
            observer.unobserve(key);
        }
        for key in &change.observe {
            if let Err(_err) = observer.observe(key) {
                swarn!(key = ?key, error = %_err, "observe failed; item will not track resizes");
            }
        }
    }

    pub fn on_resize<N>(&mut self, nodes: impl IntoIterator<Item = N>)
    where
        N: RenderedNode<Key = K>,
    {
        self.bridge.on_resize(nodes);
    }

    pub fn on_scroll(&mut self, now_ms: u64) {
        self.bridge.on_scroll(now_ms);
    }

    /// Runs the per-frame work: deferred resize invalidations, the trailing drain and a
    /// scheduled pagination re-arm.
    pub fn on_frame(&mut self, now_ms: u64) -> Option<LoadTask> {
        let registry = self.reconciler.registry();
        let work = self.bridge.on_frame(now_ms, |k| registry.contains(k));

        let mut relayout = Relayout::None;
        for key in work.resized.iter().chain(work.drained.iter()) {
            let Some(slot) = self.reconciler.slot_of_key(key) else {
                continue;
            };
            let position = self.cache.position_of(slot);
            self.cache.clear(position);
            relayout.merge(Relayout::Positions(vec![position]));
        }
        self.relayout(relayout);

        let ticket = self.pagination.borrow_mut().on_frame();
        ticket.and_then(|ticket| self.start_load(ticket))
    }

    /// Handles a visibility change of the loader slot. Returns the started load, if any.
    pub fn on_sentinel_visibility(&mut self, visible: bool) -> Option<LoadTask> {
        if self.options.infinite_scroll.is_none() {
            return None;
        }
        let ticket = self.pagination.borrow_mut().on_sentinel_visibility(visible);
        ticket.and_then(|ticket| self.start_load(ticket))
    }

    /// Updates whether more pages exist. The loader slot appears or disappears accordingly.
    pub fn set_has_more(&mut self, has_more: bool) -> Result<ReconcileReport, ScrollerError> {
        if self.options.infinite_scroll.is_none() {
            return Err(ScrollerError::NotPaginated);
        }
        self.pagination.borrow_mut().set_has_more(has_more);
        if !self.reconciler.is_initialized() {
            return Ok(ReconcileReport::default());
        }
        let keys = self.reconciler.registry().keys().to_vec();
        Ok(self.sync_items(keys))
    }

    /// Resolves the nearest scrollable ancestor of `node`, for the host's visibility sensor.
    pub fn scroll_parent(&mut self, tree: &impl LayoutTree, node: NodeId) -> Option<NodeId> {
        self.scroll_parents.find(tree, node)
    }

    fn start_load(&mut self, ticket: LoadTicket) -> Option<LoadTask> {
        let Some(infinite) = self.options.infinite_scroll.as_ref() else {
            self.pagination
                .borrow_mut()
                .finish(ticket, cellcache::LoadOutcome::Failed);
            return None;
        };
        sdebug!(ticket = ticket.id(), "starting page load");
        let future = (infinite.on_load_more)();
        Some(LoadTask::new(ticket, future, Rc::downgrade(&self.pagination)))
    }

    fn keys_in(&self, start: usize, stop: usize) -> Vec<K> {
        if start > stop {
            return Vec::new();
        }
        (start..=stop.min(self.slot_count().saturating_sub(1)))
            .filter_map(|slot| self.reconciler.key_at_slot(slot).cloned())
            .collect()
    }

    fn relayout(&mut self, relayout: Relayout) {
        match relayout {
            Relayout::None => {}
            Relayout::Positions(positions) if self.engine.supports_partial_relayout() => {
                // Recompute covers everything from the given row and column onward.
                let from = positions.iter().copied().reduce(|a, b| {
                    Position::new(a.row.min(b.row), a.column.min(b.column))
                });
                strace!(count = positions.len(), "relayout: partial");
                if let Some(from) = from {
                    self.engine.recompute_layout(Some(from));
                }
            }
            Relayout::Positions(_) | Relayout::Full => {
                strace!("relayout: full");
                self.engine.recompute_layout(None);
            }
        }
    }
}

impl<K, E: VirtualizationEngine> Drop for Scroller<K, E> {
    fn drop(&mut self) {
        sdebug!("Scroller::drop");
        self.bridge.disconnect();
        if let Some(observer) = self.observer.as_mut() {
            observer.disconnect();
        }
        self.scroll_parents.clear();
    }
}

impl<K: core::fmt::Debug, E: VirtualizationEngine + core::fmt::Debug> core::fmt::Debug
    for Scroller<K, E>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scroller")
            .field("engine", &self.engine)
            .field("options", &self.options)
            .field("cache", &self.cache)
            .field("reconciler", &self.reconciler)
            .field("pagination", &self.pagination)
            .field("rendered", &self.rendered)
            .finish_non_exhaustive()
    }
}
