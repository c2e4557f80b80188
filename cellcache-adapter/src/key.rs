/// Keys a [`crate::Scroller`] can track: hashable, cloneable and printable for error reports.
pub trait ScrollerKey: cellcache::ItemKey + Clone + core::fmt::Debug + 'static {}
impl<T: cellcache::ItemKey + Clone + core::fmt::Debug + 'static> ScrollerKey for T {}
