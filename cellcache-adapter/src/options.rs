use std::future::Future;
use std::rc::Rc;

use cellcache::{CacheError, CacheOptions, DEFAULT_BATCH_DELAY_MS};
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::BoxError;

/// Default number of slots rendered beyond each edge of the visible window.
pub const DEFAULT_OVERSCAN_COUNT: usize = 10;

/// Application callback that fetches the next page.
///
/// The host appends (or, in reverse mode, prepends) the loaded keys and calls
/// [`crate::Scroller::sync_items`] before the returned future resolves or right after.
pub type LoadMoreCallback = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<(), BoxError>>>;

/// Infinite-scroll configuration.
pub struct InfiniteScroll {
    pub on_load_more: LoadMoreCallback,
    /// Initial value; later updates go through [`crate::Scroller::set_has_more`].
    pub has_more: bool,
    /// Chat-style lists: the sentinel sits before the first item and the list starts scrolled to
    /// the end.
    pub scroll_reverse: bool,
    /// Visibility ratio of the sentinel that counts as visible. Forwarded to the host's
    /// visibility sensor.
    pub threshold: f32,
}

impl InfiniteScroll {
    pub fn new<F, Fut>(has_more: bool, on_load_more: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<(), BoxError>> + 'static,
    {
        Self {
            on_load_more: Rc::new(move || on_load_more().boxed_local()),
            has_more,
            scroll_reverse: false,
            threshold: 0.0,
        }
    }

    pub fn with_scroll_reverse(mut self, scroll_reverse: bool) -> Self {
        self.scroll_reverse = scroll_reverse;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(CacheError::InvalidOptions("threshold must be within 0..=1"));
        }
        Ok(())
    }
}

impl Clone for InfiniteScroll {
    fn clone(&self) -> Self {
        Self {
            on_load_more: Rc::clone(&self.on_load_more),
            has_more: self.has_more,
            scroll_reverse: self.scroll_reverse,
            threshold: self.threshold,
        }
    }
}

impl core::fmt::Debug for InfiniteScroll {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InfiniteScroll")
            .field("on_load_more", &"<callback>")
            .field("has_more", &self.has_more)
            .field("scroll_reverse", &self.scroll_reverse)
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Configuration for [`crate::Scroller`].
#[derive(Clone, Debug)]
pub struct ScrollerOptions {
    /// Columns per row; `1` renders a list.
    pub column_count: usize,
    pub overscan_count: usize,
    /// Trailing delay before off-screen resize invalidations are drained.
    pub batch_delay_ms: u64,
    /// Placeholder sizes. Its column count is replaced by `column_count`.
    pub cache: CacheOptions,
    pub infinite_scroll: Option<InfiniteScroll>,
}

impl Default for ScrollerOptions {
    fn default() -> Self {
        Self {
            column_count: 1,
            overscan_count: DEFAULT_OVERSCAN_COUNT,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            cache: CacheOptions::default(),
            infinite_scroll: None,
        }
    }
}

impl ScrollerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column_count(mut self, column_count: usize) -> Self {
        self.column_count = column_count;
        self
    }

    pub fn with_overscan_count(mut self, overscan_count: usize) -> Self {
        self.overscan_count = overscan_count;
        self
    }

    pub fn with_batch_delay_ms(mut self, batch_delay_ms: u64) -> Self {
        self.batch_delay_ms = batch_delay_ms;
        self
    }

    pub fn with_cache(mut self, cache: CacheOptions) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_infinite_scroll(mut self, infinite_scroll: InfiniteScroll) -> Self {
        self.infinite_scroll = Some(infinite_scroll);
        self
    }

    /// Validates everything and returns the effective cache options.
    pub fn cache_options(&self) -> Result<CacheOptions, CacheError> {
        if let Some(infinite) = &self.infinite_scroll {
            infinite.validate()?;
        }
        let options = CacheOptions::with_columns(self.column_count)?
            .with_default_size(self.cache.default_width, self.cache.default_height);
        options.validate()?;
        Ok(options)
    }
}
