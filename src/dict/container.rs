//! The morf-dict container: a lazily-resolving, parent-chained key-value
//! store.
//!
//! A [`MorfDict`] is a cheap-to-clone handle over shared storage; cloning the
//! handle aliases the underlying entries. Containers may reference each other
//! both as values (nested children) and as fallback parents, so the reference
//! graph is deliberately cyclic-capable. Cycles are not rejected at
//! construction; resolution carries a depth guard that reports them as
//! [`DictError::CircularReference`] instead of overflowing the stack.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::depth::DepthGuard;

use super::error::DictError;
use super::morf::{self, MorfFn};
use super::value::{Table, Value};

struct Node {
    entries: IndexMap<String, Value>,
    morfs: HashMap<String, MorfFn>,
    default_morf: MorfFn,
    parents: Vec<MorfDict>,
}

/// A nested, parent-chained, lazily-transforming key-value store.
///
/// Every read passes the raw value through a transform ("morf"): either a
/// per-key override registered with [`set_morf`](Self::set_morf), or the
/// container's default strategy. [`MorfDict::new`] uses the pass-through
/// default; [`MorfDict::interpolating`] substitutes `%(key)s` placeholders in
/// string values, recursively and at every read.
///
/// Keys containing a `:` are compound: `"left:right"` addresses `right`
/// inside the nested container stored at `left`, auto-vivifying it on write.
///
/// ## Example
///
/// ```
/// use morfdict::MorfDict;
///
/// let settings = MorfDict::interpolating();
/// settings.set("host", "localhost")?;
/// settings.set("url", "http://%(host)s/api")?;
/// assert_eq!(settings.get("url")?.as_str(), Some("http://localhost/api"));
///
/// settings.set("db:name", "app")?;
/// assert_eq!(settings.get("db:name")?.as_str(), Some("app"));
/// # Ok::<(), morfdict::DictError>(())
/// ```
#[derive(Clone)]
pub struct MorfDict {
    inner: Rc<RefCell<Node>>,
}

impl MorfDict {
    /// Creates an empty container whose default transform passes raw values
    /// through unchanged.
    pub fn new() -> Self {
        Self::with_default(Rc::new(morf::identity))
    }

    /// Creates an empty container whose default transform interpolates
    /// `%(key)s` placeholders in string values.
    pub fn interpolating() -> Self {
        Self::with_default(Rc::new(morf::interpolate))
    }

    /// Creates an empty container with an explicit default transform.
    pub fn with_default(default_morf: MorfFn) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Node {
                entries: IndexMap::new(),
                morfs: HashMap::new(),
                default_morf,
                parents: Vec::new(),
            })),
        }
    }

    /// Returns true when both handles alias the same underlying storage.
    pub fn ptr_eq(&self, other: &MorfDict) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resolves `key` through local storage, the parent chain, and the
    /// applicable morf transform.
    ///
    /// For a compound key the left segment resolves first (local raw value,
    /// else parents), then the right segment is looked up on the resulting
    /// child container only; the right segment is never rescued from this
    /// container's parents. The error always names the full requested key.
    pub fn get(&self, key: &str) -> Result<Value, DictError> {
        let _guard = DepthGuard::enter().ok_or(DictError::CircularReference)?;

        let (left, right) = split_key(key);
        let value = self.lookup(left).map_err(|err| match err {
            DictError::KeyNotFound(_) => DictError::KeyNotFound(key.to_string()),
            other => other,
        })?;

        match right {
            None => {
                let transform = self
                    .morf_override(key)
                    .unwrap_or_else(|| self.default_morf());
                transform(self, value)
            }
            Some(right) => {
                let child = match &value {
                    Value::Dict(child) => child.clone(),
                    _ => return Err(DictError::NotAContainer(key.to_string())),
                };
                let resolved = match child.get(right) {
                    Ok(value) => value,
                    Err(DictError::KeyNotFound(missing)) if missing == right => {
                        return Err(DictError::KeyNotFound(key.to_string()))
                    }
                    Err(other) => return Err(other),
                };
                // Compound keys resolve by splitting; the default transform
                // already ran in the child's scope. Only an explicit override
                // registered under the full key applies here.
                match self.morf_override(key) {
                    Some(transform) => transform(self, resolved),
                    None => Ok(resolved),
                }
            }
        }
    }

    /// Resolves `key`, falling back to `default` when the key itself is
    /// absent.
    ///
    /// Only a [`DictError::KeyNotFound`] naming the requested key is rescued;
    /// a transitive failure (a placeholder's key missing, a morf error)
    /// propagates. An "empty" default is still a default.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Result<Value, DictError> {
        match self.get(key) {
            Err(DictError::KeyNotFound(missing)) if missing == key => Ok(default.into()),
            other => other,
        }
    }

    /// Stores `value` under `key`.
    ///
    /// A plain [`Value::Table`] is promoted to a child container sharing this
    /// container's default transform, and any child container stored as a
    /// value gains this container as a fallback parent. A compound key routes
    /// the write into the nested container at the left segment, creating it
    /// if the segment has no local entry.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), DictError> {
        let value = match value.into() {
            Value::Table(table) => {
                let promoted = MorfDict::with_default(self.default_morf());
                promoted.extend(table)?;
                Value::Dict(promoted)
            }
            other => other,
        };
        if let Value::Dict(child) = &value {
            child.append_parent(self);
        }

        match split_key(key) {
            (_, None) => {
                self.inner
                    .borrow_mut()
                    .entries
                    .insert(key.to_string(), value);
                Ok(())
            }
            (left, Some(right)) => match self.raw_local(left) {
                Some(Value::Dict(existing)) => existing.set(right, value),
                Some(_) => Err(DictError::NotAContainer(key.to_string())),
                None => {
                    let child = MorfDict::with_default(self.default_morf());
                    child.append_parent(self);
                    child.set(right, value)?;
                    self.inner
                        .borrow_mut()
                        .entries
                        .insert(left.to_string(), Value::Dict(child));
                    Ok(())
                }
            },
        }
    }

    /// Inserts every entry of `table` in order, as if by repeated
    /// [`set`](Self::set).
    pub fn extend(&self, table: Table) -> Result<(), DictError> {
        for (key, value) in table {
            self.set(&key, value)?;
        }
        Ok(())
    }

    /// Registers a transform override for `key`, replacing the default for
    /// that key only.
    pub fn set_morf<F>(&self, key: &str, transform: F)
    where
        F: Fn(&MorfDict, Value) -> Result<Value, DictError> + 'static,
    {
        self.inner
            .borrow_mut()
            .morfs
            .insert(key.to_string(), Rc::new(transform));
    }

    /// Removes the transform override for `key`.
    pub fn del_morf(&self, key: &str) -> Result<(), DictError> {
        self.inner
            .borrow_mut()
            .morfs
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| DictError::NoMorf(key.to_string()))
    }

    /// Returns the transform override registered for `key`.
    pub fn get_morf(&self, key: &str) -> Result<MorfFn, DictError> {
        self.inner
            .borrow()
            .morfs
            .get(key)
            .cloned()
            .ok_or_else(|| DictError::NoMorf(key.to_string()))
    }

    /// Adds a fallback scope, consulted after local storage and any
    /// previously-added parents. Parents are shared, never owned; the same
    /// parent may appear more than once.
    pub fn append_parent(&self, parent: &MorfDict) {
        self.inner.borrow_mut().parents.push(parent.clone());
    }

    /// Adds a fallback scope and stores this container under `key` on the
    /// parent, linking both directions in one call.
    pub fn append_parent_under(&self, parent: &MorfDict, key: &str) -> Result<(), DictError> {
        self.append_parent(parent);
        parent.set(key, self.clone())
    }

    /// Produces a fully-resolved plain snapshot of the local entries, with
    /// nested containers converted recursively. Fails on the first key that
    /// does not resolve.
    pub fn to_dict(&self) -> Result<Table, DictError> {
        let mut data = Table::new();
        for key in self.keys() {
            let value = match self.get(&key)? {
                Value::Dict(child) => Value::Table(child.to_dict()?),
                other => other,
            };
            data.insert(key, value);
        }
        Ok(data)
    }

    /// Iterates `(key, resolved value)` over local entries in insertion
    /// order. Keys that fail to resolve are skipped; use
    /// [`get_errors`](Self::get_errors) to audit them.
    pub fn items(&self) -> impl Iterator<Item = (String, Value)> + '_ {
        self.keys()
            .into_iter()
            .filter_map(move |key| self.get(&key).ok().map(|value| (key, value)))
    }

    /// Deep-merges another container into this one.
    ///
    /// Where both sides hold a nested container the merge recurses; otherwise
    /// `other`'s raw, unresolved value overwrites — so placeholders re-resolve
    /// in the merged scope, not in `other`'s. Afterwards `other`'s parent list
    /// is appended to this container's, duplicates included.
    pub fn merge(&self, other: &MorfDict) -> Result<(), DictError> {
        for key in other.keys() {
            let Some(raw) = other.raw_local(&key) else {
                continue;
            };
            match (&raw, self.raw_local(&key)) {
                (Value::Dict(theirs), Some(Value::Dict(ours))) => ours.merge(theirs)?,
                _ => self.set(&key, raw)?,
            }
        }
        let adopted = other.inner.borrow().parents.clone();
        self.inner.borrow_mut().parents.extend(adopted);
        Ok(())
    }

    /// Attempts to resolve every local key, recursing into nested containers,
    /// and returns the collected failures — at most one per key. Never fails
    /// itself.
    pub fn get_errors(&self) -> Vec<DictError> {
        let mut errors = Vec::new();
        for key in self.keys() {
            let result = match self.get(&key) {
                Ok(Value::Dict(child)) => child.to_dict().map(|_| ()),
                Ok(_) => Ok(()),
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                errors.push(err);
            }
        }
        errors
    }

    /// Local keys in insertion order. Parent-inherited keys are not listed.
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().entries.keys().cloned().collect()
    }

    /// Whether `key` has a local entry. Parents are not consulted.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Local raw value, untransformed; parents are not consulted.
    fn raw_local(&self, key: &str) -> Option<Value> {
        self.inner.borrow().entries.get(key).cloned()
    }

    /// Raw local entry, else the first parent that resolves the key. Parent
    /// hits come back resolved in the parent's own scope; a parent failing
    /// with `KeyNotFound` is skipped in favour of later parents.
    fn lookup(&self, key: &str) -> Result<Value, DictError> {
        if let Some(value) = self.raw_local(key) {
            return Ok(value);
        }
        let parents = self.inner.borrow().parents.clone();
        for parent in parents {
            match parent.get(key) {
                Ok(value) => return Ok(value),
                Err(DictError::KeyNotFound(_)) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(DictError::KeyNotFound(key.to_string()))
    }

    fn default_morf(&self) -> MorfFn {
        self.inner.borrow().default_morf.clone()
    }

    fn morf_override(&self, key: &str) -> Option<MorfFn> {
        self.inner.borrow().morfs.get(key).cloned()
    }
}

impl Default for MorfDict {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MorfDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.inner.borrow();
        f.debug_struct("MorfDict")
            .field("keys", &node.entries.keys().collect::<Vec<_>>())
            .field("morfs", &node.morfs.len())
            .field("parents", &node.parents.len())
            .finish()
    }
}

/// Splits a compound key at the first `:`; the right remainder may itself be
/// compound.
fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once(':') {
        Some((left, right)) => (left, Some(right)),
        None => (key, None),
    }
}
