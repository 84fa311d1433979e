use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PathsError {
    #[error("path not found: {0}")]
    KeyNotFound(String),

    #[error("circular parent chain detected during path resolution")]
    CircularReference,

    #[error("path generator failed: {0}")]
    Generator(String),
}
