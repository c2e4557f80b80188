use core::num::NonZeroUsize;

use crate::key::KeyMap;
use crate::{CacheError, MeasurementEntry, Position, Size};

/// Placeholder height for unmeasured slots.
///
/// Must stay positive: a zero-height row would hide its item and break offset math.
pub const DEFAULT_HEIGHT: f32 = 1.0;
/// Placeholder width for unmeasured slots.
pub const DEFAULT_WIDTH: f32 = 100.0;

/// Configuration for [`MeasurementCache`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheOptions {
    pub column_count: NonZeroUsize,
    pub default_width: f32,
    pub default_height: f32,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            column_count: NonZeroUsize::MIN,
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
        }
    }
}

impl CacheOptions {
    /// Options for a grid with `column_count` columns.
    ///
    /// Fails with [`CacheError::InvalidOptions`] when `column_count` is zero.
    pub fn with_columns(column_count: usize) -> Result<Self, CacheError> {
        let column_count = NonZeroUsize::new(column_count)
            .ok_or(CacheError::InvalidOptions("column_count must be at least 1"))?;
        Ok(Self {
            column_count,
            ..Self::default()
        })
    }

    pub fn with_default_size(mut self, width: f32, height: f32) -> Self {
        self.default_width = width;
        self.default_height = height;
        self
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if !(self.default_height.is_finite() && self.default_height > 0.0) {
            return Err(CacheError::InvalidOptions(
                "default_height must be a positive finite number",
            ));
        }
        if !(self.default_width.is_finite() && self.default_width > 0.0) {
            return Err(CacheError::InvalidOptions(
                "default_width must be a positive finite number",
            ));
        }
        Ok(())
    }
}

/// Per-position width/height store with placeholder defaults.
///
/// Every position is readable: slots that were never written, or were cleared, report the
/// placeholder size. Only measured slots are stored, keyed by linear index.
#[derive(Clone, Debug)]
pub struct MeasurementCache {
    options: CacheOptions,
    entries: KeyMap<usize, MeasurementEntry>,
}

impl Default for MeasurementCache {
    fn default() -> Self {
        Self {
            options: CacheOptions::default(),
            entries: KeyMap::new(),
        }
    }
}

impl MeasurementCache {
    pub fn new(options: CacheOptions) -> Result<Self, CacheError> {
        options.validate()?;
        cdebug!(
            column_count = options.column_count.get(),
            default_height = options.default_height,
            "MeasurementCache::new"
        );
        Ok(Self {
            options,
            entries: KeyMap::new(),
        })
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn column_count(&self) -> NonZeroUsize {
        self.options.column_count
    }

    pub fn position_of(&self, index: usize) -> Position {
        Position::from_index(index, self.options.column_count)
    }

    pub fn index_of(&self, position: Position) -> usize {
        position.to_index(self.options.column_count)
    }

    pub fn placeholder(&self) -> Size {
        Size::new(self.options.default_width, self.options.default_height)
    }

    /// Returns the raw entry, `UNMEASURED` for slots never written.
    pub fn entry(&self, position: Position) -> MeasurementEntry {
        let Some(index) = self.slot(position) else {
            return MeasurementEntry::UNMEASURED;
        };
        self.entries
            .get(&index)
            .copied()
            .unwrap_or(MeasurementEntry::UNMEASURED)
    }

    /// Returns the stored size, or the placeholder for unmeasured dimensions.
    pub fn get(&self, position: Position) -> Size {
        let entry = self.entry(position);
        Size {
            width: entry.width.unwrap_or(self.options.default_width),
            height: entry.height.unwrap_or(self.options.default_height),
        }
    }

    pub fn width(&self, position: Position) -> f32 {
        self.get(position).width
    }

    pub fn height(&self, position: Position) -> f32 {
        self.get(position).height
    }

    pub fn is_measured(&self, position: Position) -> bool {
        !self.entry(position).is_placeholder()
    }

    /// Stores a measurement.
    ///
    /// Only zero or positive finite sizes are accepted. Anything else returns
    /// [`CacheError::InvalidMeasurement`] and leaves the slot untouched.
    pub fn set(&mut self, position: Position, width: f32, height: f32) -> Result<(), CacheError> {
        if !is_valid_dimension(width) || !is_valid_dimension(height) {
            cwarn!(
                row = position.row,
                column = position.column,
                width,
                height,
                "rejected measurement"
            );
            return Err(CacheError::InvalidMeasurement {
                position,
                width,
                height,
            });
        }
        let Some(index) = self.slot(position) else {
            return Err(CacheError::InvalidMeasurement {
                position,
                width,
                height,
            });
        };
        ctrace!(row = position.row, column = position.column, width, height, "set");
        self.entries
            .insert(index, MeasurementEntry::measured(width, height));
        Ok(())
    }

    /// Writes a raw entry back, used when migrating a measurement to a new slot.
    pub(crate) fn put(&mut self, position: Position, entry: MeasurementEntry) {
        if entry.is_placeholder() {
            self.clear(position);
            return;
        }
        let Some(index) = self.slot(position) else {
            return;
        };
        self.entries.insert(index, entry);
    }

    /// Resets a slot to the placeholder. The slot itself keeps existing.
    pub fn clear(&mut self, position: Position) {
        let Some(index) = self.slot(position) else {
            return;
        };
        self.entries.remove(&index);
    }

    pub fn clear_all(&mut self) {
        cdebug!(measured = self.measured_len(), "clear_all");
        self.entries.clear();
    }

    /// Number of slots currently holding a real measurement.
    pub fn measured_len(&self) -> usize {
        self.entries.len()
    }

    /// Row height as the engine needs it: the tallest cell in the row.
    pub fn row_height(&self, row: usize) -> f32 {
        (0..self.options.column_count.get())
            .map(|column| self.height(Position::new(row, column)))
            .fold(0.0, f32::max)
    }

    /// Column width: the widest measured cell in the column, or the placeholder.
    pub fn column_width(&self, column: usize) -> f32 {
        let columns = self.options.column_count.get();
        if column >= columns {
            return self.options.default_width;
        }
        self.entries
            .iter()
            .filter(|(index, _)| *index % columns == column)
            .filter_map(|(_, e)| e.width)
            .reduce(f32::max)
            .unwrap_or(self.options.default_width)
    }

    fn slot(&self, position: Position) -> Option<usize> {
        if position.column >= self.options.column_count.get() {
            cwarn!(
                column = position.column,
                columns = self.options.column_count.get(),
                "column out of range"
            );
            return None;
        }
        Some(position.to_index(self.options.column_count))
    }
}

fn is_valid_dimension(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}
