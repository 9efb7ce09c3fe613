use memeradar_core::CoreError;
use memeradar_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("record not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("content store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid analysis configuration: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Outcome of a failed perceptual-hash attempt.
///
/// [`ImageHashError::Unavailable`] leaves the media pending so the next cycle
/// retries it. [`ImageHashError::Unhashable`] is permanent.
#[derive(Debug, Error)]
pub enum ImageHashError {
    #[error("image unavailable: {0}")]
    Unavailable(String),

    #[error("image cannot be hashed: {0}")]
    Unhashable(String),
}

impl ImageHashError {
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, ImageHashError::Unhashable(_))
    }
}
