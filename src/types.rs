use core::num::NonZeroUsize;

/// A cache slot in the two-dimensional layout.
///
/// Positions are derived from a linear slot index and a fixed column count; a list is the
/// `column_count = 1` case.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    pub fn from_index(index: usize, column_count: NonZeroUsize) -> Self {
        let columns = column_count.get();
        Self {
            row: index / columns,
            column: index % columns,
        }
    }

    pub fn to_index(self, column_count: NonZeroUsize) -> usize {
        self.row
            .saturating_mul(column_count.get())
            .saturating_add(self.column)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A stored measurement. `None` means the dimension has not been measured yet.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementEntry {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl MeasurementEntry {
    pub const UNMEASURED: Self = Self {
        width: None,
        height: None,
    };

    pub fn measured(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Returns `true` while the entry still holds the placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

/// What the virtualization engine reports after each render pass.
///
/// All indices are inclusive slot indices (items plus the pagination sentinel, if any).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderedRange {
    pub start_index: usize,
    pub stop_index: usize,
    pub overscan_start_index: usize,
    pub overscan_stop_index: usize,
}

impl RenderedRange {
    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..=self.stop_index).contains(&index)
    }

    pub fn overscan_contains(&self, index: usize) -> bool {
        (self.overscan_start_index..=self.overscan_stop_index).contains(&index)
    }
}

/// Inclusive overscan bounds returned by [`overscan_indices`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverscanIndices {
    pub overscan_start_index: usize,
    pub overscan_stop_index: usize,
}

/// Default overscan policy: widen `[start, stop]` by `overscan_count` on both sides and clamp to
/// `[0, total_count - 1]`.
///
/// Returns `None` when there is nothing to render.
pub fn overscan_indices(
    start_index: usize,
    stop_index: usize,
    overscan_count: usize,
    total_count: usize,
) -> Option<OverscanIndices> {
    let last = total_count.checked_sub(1)?;
    Some(OverscanIndices {
        overscan_start_index: start_index.saturating_sub(overscan_count).min(last),
        overscan_stop_index: stop_index.saturating_add(overscan_count).min(last),
    })
}

/// Where the pagination sentinel (the loader slot) sits in the rendered sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sentinel {
    #[default]
    None,
    /// Before the first item (reverse scrolling). Items start at slot 1.
    Leading,
    /// After the last item.
    Trailing,
}

impl Sentinel {
    /// Slot offset applied to item indices.
    pub fn item_offset(self) -> usize {
        match self {
            Self::Leading => 1,
            Self::None | Self::Trailing => 0,
        }
    }

    /// Slot index of the sentinel for a sequence of `item_count` items.
    pub fn slot_index(self, item_count: usize) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Leading => Some(0),
            Self::Trailing => Some(item_count),
        }
    }

    pub fn slot_count(self, item_count: usize) -> usize {
        match self {
            Self::None => item_count,
            Self::Leading | Self::Trailing => item_count.saturating_add(1),
        }
    }
}

/// A rendered slot: either an item (with its index in the sequence) or the sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot<'a, K> {
    Item { key: &'a K, index: usize },
    Sentinel,
}

/// Relayout work requested after a cache change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Relayout {
    #[default]
    None,
    /// Only these positions changed (sorted, deduplicated).
    Positions(alloc::vec::Vec<Position>),
    Full,
}

impl Relayout {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Folds another request into this one.
    pub fn merge(&mut self, other: Relayout) {
        let merged = match (core::mem::take(self), other) {
            (Self::Full, _) | (_, Self::Full) => Self::Full,
            (Self::None, next) | (next, Self::None) => next,
            (Self::Positions(mut a), Self::Positions(b)) => {
                a.extend(b);
                a.sort_unstable();
                a.dedup();
                Self::Positions(a)
            }
        };
        *self = merged;
    }
}
