use cellcache::Position;

/// The virtualization engine the scroller drives.
///
/// The engine owns layout and scrolling. It reads slot sizes back through
/// [`crate::Scroller::row_height`] / [`crate::Scroller::cell_size`] and reports each render pass
/// through [`crate::Scroller::on_range_rendered`].
pub trait VirtualizationEngine {
    /// Drops cached layout from `from` onward (rows at or after `from.row`, columns at or after
    /// `from.column`), or everything when `from` is `None`. The scroller issues one call per
    /// change with the smallest affected row and column.
    fn recompute_layout(&mut self, from: Option<Position>);

    /// Whether [`VirtualizationEngine::recompute_layout`] honors a start position. Engines that
    /// cannot recompute partially get a full recompute instead.
    fn supports_partial_relayout(&self) -> bool {
        true
    }

    fn scroll_to_index(&mut self, index: usize);
}

/// The host could not start observing an item.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot observe item: {reason}")]
pub struct ObserveError {
    pub reason: String,
}

impl ObserveError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The host's resize observer, addressed by item key.
pub trait ResizeObserver<K> {
    fn observe(&mut self, key: &K) -> Result<(), ObserveError>;

    fn unobserve(&mut self, _key: &K) {}

    fn disconnect(&mut self);
}
