use alloc::string::String;

use crate::Position;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CacheError {
    /// `update_cache` could not resolve its target in the current sequence.
    #[error("item not found in sequence (key: {key:?}, index: {index:?})")]
    ItemNotFound {
        key: Option<String>,
        index: Option<usize>,
    },

    /// A negative, NaN or infinite size was offered to the cache.
    #[error("invalid measurement {width}x{height} at row {}, column {}", .position.row, .position.column)]
    InvalidMeasurement {
        position: Position,
        width: f32,
        height: f32,
    },

    #[error("invalid options: {0}")]
    InvalidOptions(&'static str),
}
