//! A headless measurement cache for virtualized lists and grids.
//!
//! For the scroller handle that wires this crate to a virtualization engine, a resize observer
//! and an async page loader, see the `cellcache-adapter` crate.
//!
//! A virtualization engine renders only a window of a long sequence and needs a size for every
//! slot. This crate keeps those sizes correct while the sequence changes under it:
//! - measurements are stored per `(row, column)` position with a positive placeholder
//! - a reconciler diffs the previous key order against the new one and moves measurements with
//!   their keys, so inserts, deletes and reorders only relayout the slots that changed
//! - a resize bridge turns asynchronous size changes (images, fonts) into batched invalidations
//! - a pagination state machine guards infinite-scroll loads
//!
//! It is UI-agnostic. The host adapter drives it with key orders, engine range reports, resize
//! batches and frame ticks (`now_ms`).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod error;
mod key;
mod observer;
mod pagination;
mod reconcile;
mod registry;
mod types;

#[cfg(test)]
mod tests;

pub use cache::{CacheOptions, DEFAULT_HEIGHT, DEFAULT_WIDTH, MeasurementCache};
pub use error::CacheError;
pub use key::ItemKey;
pub use observer::{
    DEFAULT_BATCH_DELAY_MS, FrameWork, ObservationState, RangeChange, RenderedNode, ResizeBridge,
    ResizedNode,
};
pub use pagination::{LoadOutcome, LoadPhase, LoadTicket, LoaderState, Pagination};
pub use reconcile::{ReconcileReport, Reconciler, UpdateTarget};
pub use registry::IdentityRegistry;
pub use types::{
    MeasurementEntry, OverscanIndices, Position, Relayout, RenderedRange, Sentinel, Size, Slot,
    overscan_indices,
};
