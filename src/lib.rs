//! Hierarchical, lazily-interpolating configuration containers.
//!
//! A [`MorfDict`] stores raw values and resolves them at read time: string
//! values interpolate `%(key)s` placeholders recursively, lookups fall back
//! through an ordered chain of parent scopes, and colon-compound keys address
//! nested child containers. A companion [`Paths`] registry applies the same
//! lazy-resolution idea to named, parent-linked filesystem path segments. The
//! [`Factory`] assembles one settings/paths pair by running a chain of
//! optionally-present modules and TOML files.

pub mod dict;
pub mod loader;
pub mod paths;

mod depth;
mod error;

pub use dict::{DictError, MorfDict, MorfFn, Table, Value};
pub use error::Error;
pub use loader::{Factory, FnModule, LoaderError, Registry, SettingsModule};
pub use paths::{Paths, PathsContext, PathsError, Segments};
