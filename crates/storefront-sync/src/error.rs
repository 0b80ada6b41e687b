//! Error types for the sync layer.

use storefront_http::ApiError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A shared service was requested from a context that was built without it.
    #[error("{0} is not provided by this context")]
    NotProvided(&'static str),
}

impl SyncError {
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, SyncError::Api(e) if e.is_access_denied())
    }
}
