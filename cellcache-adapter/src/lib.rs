//! Adapter layer for the `cellcache` crate.
//!
//! `cellcache` is UI-agnostic and only holds state machines. This crate composes them into a
//! [`Scroller`] handle that talks to the consumed capabilities through traits:
//!
//! - [`VirtualizationEngine`]: partial/full relayout and scroll-to-index
//! - [`ResizeObserver`]: per-item size observation
//! - an async page loader ([`InfiniteScroll::on_load_more`]) whose completion is delivered through
//!   a [`LoadTask`] future
//!
//! It also carries a per-instance [`ScrollParentCache`] for hosts that need the nearest
//! scrollable ancestor (e.g. as the root of a visibility sensor).
//!
//! Everything is single-threaded: shared state uses `Rc`/`RefCell` and the loader future is not
//! `Send`.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod engine;
mod error;
mod key;
mod load;
mod options;
mod scroll_parent;
mod scroller;


pub use engine::{ObserveError, ResizeObserver, VirtualizationEngine};
pub use error::{BoxError, ScrollerError};
pub use key::ScrollerKey;
pub use load::LoadTask;
pub use options::{DEFAULT_OVERSCAN_COUNT, InfiniteScroll, LoadMoreCallback, ScrollerOptions};
pub use scroll_parent::{LayoutTree, NodeId, NodeStyle, Overflow, Placement, ScrollParentCache};
pub use scroller::Scroller;
