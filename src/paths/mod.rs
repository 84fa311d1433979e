//! Named, parent-linked trees of filesystem path segments with lazy join
//! resolution.
//!
//! Elements refer to their parent by name, not by containment, so a parent
//! may be registered after its children; names only have to resolve by the
//! time [`Paths::get`] is called.

mod context;
mod error;
mod tree;

pub use context::PathsContext;
pub use error::PathsError;

use std::fmt;
use std::path::{PathBuf, MAIN_SEPARATOR};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::depth::DepthGuard;

/// A lazily-computed path element: invoked with the owning [`Paths`] on every
/// resolution, never cached.
pub type PathFn = Rc<dyn Fn(&Paths) -> Result<Segments, PathsError>>;

/// One or more literal path segments. Scalars normalize to a one-element
/// sequence.
#[derive(Debug, Clone)]
pub struct Segments(Vec<String>);

impl From<&str> for Segments {
    fn from(segment: &str) -> Self {
        Segments(vec![segment.to_string()])
    }
}

impl From<String> for Segments {
    fn from(segment: String) -> Self {
        Segments(vec![segment])
    }
}

impl From<Vec<String>> for Segments {
    fn from(segments: Vec<String>) -> Self {
        Segments(segments)
    }
}

impl From<Vec<&str>> for Segments {
    fn from(segments: Vec<&str>) -> Self {
        Segments(segments.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Segments {
    fn from(segments: [&str; N]) -> Self {
        Segments(segments.into_iter().map(str::to_string).collect())
    }
}

#[derive(Clone)]
enum PathNode {
    Element {
        parent: Option<String>,
        value: Vec<String>,
        is_root: bool,
    },
    Generator {
        parent: Option<String>,
        generate: PathFn,
        is_root: bool,
    },
}

/// A registry of named path elements, resolved on demand by walking parent
/// chains.
///
/// ## Example
///
/// ```
/// use morfdict::Paths;
///
/// let mut paths = Paths::new();
/// paths.set("project", "project", None, true);
/// paths.set("src", "src", Some("project"), false);
/// assert_eq!(paths.get("src")?, format!("{0}project{0}src", std::path::MAIN_SEPARATOR));
/// # Ok::<(), morfdict::PathsError>(())
/// ```
#[derive(Default)]
pub struct Paths {
    nodes: IndexMap<String, PathNode>,
}

impl Paths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a literal element and returns a builder scoped to `name` for
    /// fluent nested registration.
    ///
    /// `parent` names another element (which may not exist yet); `is_root`
    /// prefixes a single leading separator at resolution time.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<Segments>,
        parent: Option<&str>,
        is_root: bool,
    ) -> PathsContext<'_> {
        self.nodes.insert(
            name.to_string(),
            PathNode::Element {
                parent: parent.map(str::to_string),
                value: value.into().0,
                is_root,
            },
        );
        PathsContext::new(self, name)
    }

    /// Stores a computed element. `generate` runs against this registry on
    /// every [`get`](Self::get), so its output tracks whatever paths it reads.
    pub fn set_generator<F>(
        &mut self,
        name: &str,
        generate: F,
        parent: Option<&str>,
        is_root: bool,
    ) -> PathsContext<'_>
    where
        F: Fn(&Paths) -> Result<Segments, PathsError> + 'static,
    {
        self.nodes.insert(
            name.to_string(),
            PathNode::Generator {
                parent: parent.map(str::to_string),
                generate: Rc::new(generate),
                is_root,
            },
        );
        PathsContext::new(self, name)
    }

    /// Returns a builder scoped to an already-registered name.
    pub fn context(&mut self, name: &str) -> PathsContext<'_> {
        PathsContext::new(self, name)
    }

    /// Resolves the full joined path for `name`.
    ///
    /// The parent chain resolves first; one leading separator is prepended
    /// when this element's own `is_root` flag is set (ancestors' flags have
    /// already been applied in their own resolutions); then the element's
    /// segments join onto the prefix with the platform separator. A missing
    /// name or ancestor fails with [`PathsError::KeyNotFound`] naming the
    /// requested element.
    pub fn get(&self, name: &str) -> Result<String, PathsError> {
        let _guard = DepthGuard::enter().ok_or(PathsError::CircularReference)?;

        let node = self
            .nodes
            .get(name)
            .cloned()
            .ok_or_else(|| PathsError::KeyNotFound(name.to_string()))?;
        let (parent, is_root, segments) = match node {
            PathNode::Element {
                parent,
                value,
                is_root,
            } => (parent, is_root, value),
            PathNode::Generator {
                parent,
                generate,
                is_root,
            } => (parent, is_root, generate(self)?.0),
        };

        let mut prefix = match parent {
            Some(parent) => self.get(&parent).map_err(|err| match err {
                PathsError::KeyNotFound(_) => PathsError::KeyNotFound(name.to_string()),
                other => other,
            })?,
            None => String::new(),
        };
        if is_root {
            prefix.insert(0, MAIN_SEPARATOR);
        }

        let mut joined = PathBuf::from(prefix);
        for segment in &segments {
            joined.push(segment);
        }
        Ok(joined.to_string_lossy().into_owned())
    }

    /// Resolves every registered name. Fails on the first unresolvable one.
    pub fn to_dict(&self) -> Result<IndexMap<String, String>, PathsError> {
        let mut data = IndexMap::new();
        for name in self.nodes.keys() {
            data.insert(name.clone(), self.get(name)?);
        }
        Ok(data)
    }

    /// Attempts every registered name and returns the collected failures.
    /// Never fails itself.
    pub fn get_errors(&self) -> Vec<PathsError> {
        self.nodes
            .keys()
            .filter_map(|name| self.get(name).err())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Debug for Paths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paths")
            .field("names", &self.nodes.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sep() -> String {
        MAIN_SEPARATOR.to_string()
    }

    #[test]
    fn test_simple_set_get() {
        let mut paths = Paths::new();
        paths.set("name", "value", None, false);
        assert_eq!(paths.get("name").unwrap(), "value");
    }

    #[test]
    fn test_parent_join() {
        let mut paths = Paths::new();
        paths.set("p", "a", None, false);
        paths.set("q", "b", Some("p"), false);
        assert_eq!(paths.get("q").unwrap(), format!("a{}b", sep()));
    }

    #[test]
    fn test_multi_segment_value() {
        let mut paths = Paths::new();
        paths.set("nested", vec!["a", "b", "c"], None, false);
        assert_eq!(paths.get("nested").unwrap(), format!("a{0}b{0}c", sep()));
    }

    #[test]
    fn test_is_root_prefixes_once() {
        let mut paths = Paths::new();
        paths.set("r", "x", None, true);
        assert_eq!(paths.get("r").unwrap(), format!("{}x", sep()));
    }

    #[test]
    fn test_root_child_does_not_re_add_separator() {
        let mut paths = Paths::new();
        paths.set("r", "x", None, true);
        paths.set("c", "y", Some("r"), false);
        assert_eq!(paths.get("c").unwrap(), format!("{0}x{0}y", sep()));
    }

    #[test]
    fn test_forward_reference_parent() {
        let mut paths = Paths::new();
        paths.set("child", "b", Some("base"), false);
        paths.set("base", "a", None, false);
        assert_eq!(paths.get("child").unwrap(), format!("a{}b", sep()));
    }

    #[test]
    fn test_missing_name() {
        let paths = Paths::new();
        let err = paths.get("missing").unwrap_err();
        assert!(matches!(err, PathsError::KeyNotFound(name) if name == "missing"));
    }

    #[test]
    fn test_missing_ancestor_names_requested_element() {
        let mut paths = Paths::new();
        paths.set("child", "b", Some("gone"), false);
        let err = paths.get("child").unwrap_err();
        assert!(matches!(err, PathsError::KeyNotFound(name) if name == "child"));
    }

    #[test]
    fn test_generator_resolves_lazily() {
        let mut paths = Paths::new();
        paths.set("base", "a", None, false);
        paths.set_generator(
            "backup",
            |paths| Ok(Segments::from(format!("{}.bak", paths.get("base")?))),
            None,
            false,
        );
        assert_eq!(paths.get("backup").unwrap(), "a.bak");

        // not cached: re-registering the dependency changes the next read
        paths.set("base", "z", None, false);
        assert_eq!(paths.get("backup").unwrap(), "z.bak");
    }

    #[test]
    fn test_generator_with_parent_and_root() {
        let mut paths = Paths::new();
        paths.set("home", "home", None, true);
        paths.set_generator(
            "cache",
            |_| Ok(Segments::from(["var", "cache"])),
            Some("home"),
            false,
        );
        assert_eq!(
            paths.get("cache").unwrap(),
            format!("{0}home{0}var{0}cache", sep())
        );
    }

    #[test]
    fn test_generator_failure_propagates() {
        let mut paths = Paths::new();
        paths.set_generator(
            "broken",
            |_| Err(PathsError::Generator("no base".to_string())),
            None,
            false,
        );
        assert!(matches!(
            paths.get("broken"),
            Err(PathsError::Generator(msg)) if msg == "no base"
        ));
    }

    #[test]
    fn test_cyclic_parents_detected() {
        let mut paths = Paths::new();
        paths.set("a", "a", Some("b"), false);
        paths.set("b", "b", Some("a"), false);
        assert!(matches!(paths.get("a"), Err(PathsError::CircularReference)));
    }

    #[test]
    fn test_to_dict() {
        let mut paths = Paths::new();
        paths.set("p", "a", None, false);
        paths.set("q", "b", Some("p"), false);
        let resolved = paths.to_dict().unwrap();
        assert_eq!(resolved["p"], "a");
        assert_eq!(resolved["q"], format!("a{}b", sep()));
    }

    #[test]
    fn test_to_dict_fails_fast() {
        let mut paths = Paths::new();
        paths.set("orphan", "x", Some("gone"), false);
        assert!(paths.to_dict().is_err());
    }

    #[test]
    fn test_get_errors_collects_without_raising() {
        let mut paths = Paths::new();
        paths.set("a", "a", None, false);
        paths.set("b", "b", Some("a"), false);
        paths.set("orphan", "x", Some("gone"), false);
        paths.set("c", "c", None, false);
        paths.set("d", "d", Some("c"), false);
        let errors = paths.get_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], PathsError::KeyNotFound(name) if name == "orphan"));
    }
}
