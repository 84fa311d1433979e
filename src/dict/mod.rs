//! Lazily-resolving configuration containers.

mod container;
mod convert;
mod error;
pub mod morf;
mod value;

pub use container::MorfDict;
pub use convert::from_toml_table;
pub use error::DictError;
pub use morf::MorfFn;
pub use value::{Table, Value};
