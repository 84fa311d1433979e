use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DictError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("key '{0}' does not address a nested container")]
    NotAContainer(String),

    #[error("circular reference detected during resolution")]
    CircularReference,

    #[error("unclosed placeholder (missing ')')")]
    UnclosedPlaceholder,

    #[error("placeholder '%({0})' is not terminated by 's'")]
    InvalidPlaceholder(String),

    #[error("cannot interpolate non-scalar value: {0}")]
    NonScalarPlaceholder(String),

    #[error("no morf registered for key: {0}")]
    NoMorf(String),

    #[error("morf transform failed: {0}")]
    Transform(String),

    #[error("failed to deserialize settings: {0}")]
    Deserialize(#[from] toml::de::Error),
}
