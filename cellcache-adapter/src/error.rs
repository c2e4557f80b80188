use cellcache::CacheError;

/// Error type of an application page loader.
pub type BoxError = Box<dyn std::error::Error>;

#[derive(Debug, thiserror::Error)]
pub enum ScrollerError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("page loader failed")]
    LoaderFailure(#[source] BoxError),
    #[error("infinite scroll is not configured")]
    NotPaginated,
}
