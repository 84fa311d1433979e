use crate::dict::DictError;
use crate::loader::LoaderError;
use crate::paths::PathsError;
use thiserror::Error;

/// Top-level error type for the morfdict library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("settings error: {0}")]
    Dict(#[from] DictError),

    #[error("paths error: {0}")]
    Paths(#[from] PathsError),

    #[error("loader error: {0}")]
    Loader(#[from] LoaderError),
}
