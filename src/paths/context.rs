//! Scoped builder for registering nested path elements.

use super::{Paths, PathsError, Segments};

/// A builder bound to one registered name; child registrations made through
/// it get that name as their parent implicitly.
///
/// Contexts are pure sugar over [`Paths`] — they hold no state of their own
/// and need no cleanup.
///
/// ## Example
///
/// ```
/// use morfdict::Paths;
///
/// let mut paths = Paths::new();
/// let mut project = paths.set("project", "project", None, true);
/// let mut src = project.set("src", "src", false);
/// src.set("main", "main.rs", false);
/// # Ok::<(), morfdict::PathsError>(())
/// ```
pub struct PathsContext<'a> {
    paths: &'a mut Paths,
    name: String,
}

impl<'a> PathsContext<'a> {
    pub(super) fn new(paths: &'a mut Paths, name: &str) -> Self {
        Self {
            paths,
            name: name.to_string(),
        }
    }

    /// The name this context is scoped to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a literal child of this context's element.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<Segments>,
        is_root: bool,
    ) -> PathsContext<'_> {
        let parent = self.name.clone();
        self.paths.set(name, value, Some(&parent), is_root)
    }

    /// Registers a computed child of this context's element.
    pub fn set_generator<F>(&mut self, name: &str, generate: F, is_root: bool) -> PathsContext<'_>
    where
        F: Fn(&Paths) -> Result<Segments, PathsError> + 'static,
    {
        let parent = self.name.clone();
        self.paths.set_generator(name, generate, Some(&parent), is_root)
    }

    /// Re-enters the registry at any other name, not just children of this
    /// one.
    pub fn context(&mut self, name: &str) -> PathsContext<'_> {
        self.paths.context(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::MAIN_SEPARATOR;

    fn sep() -> String {
        MAIN_SEPARATOR.to_string()
    }

    #[test]
    fn test_context_supplies_parent() {
        let mut paths = Paths::new();
        let mut base = paths.set("base", "a", None, false);
        base.set("child", "b", false);
        assert_eq!(paths.get("child").unwrap(), format!("a{}b", sep()));
    }

    #[test]
    fn test_nested_contexts() {
        let mut paths = Paths::new();
        let mut project = paths.set("project", "project", None, true);
        let mut src = project.set("src", "src", false);
        src.set("main", "main.rs", false);
        assert_eq!(
            paths.get("main").unwrap(),
            format!("{0}project{0}src{0}main.rs", sep())
        );
    }

    #[test]
    fn test_context_reentry_by_name() {
        let mut paths = Paths::new();
        paths.set("a", "a", None, false);
        let mut b = paths.set("b", "b", None, false);
        let mut a = b.context("a");
        a.set("under_a", "x", false);
        assert_eq!(paths.get("under_a").unwrap(), format!("a{}x", sep()));
    }

    #[test]
    fn test_context_generator_child() {
        let mut paths = Paths::new();
        let mut base = paths.set("base", "a", None, false);
        base.set_generator("derived", |_| Ok(Segments::from("gen")), false);
        assert_eq!(paths.get("derived").unwrap(), format!("a{}gen", sep()));
    }
}
