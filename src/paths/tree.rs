//! Human-readable tree rendering of a path registry.

use std::path::MAIN_SEPARATOR;

use indexmap::IndexMap;

use super::{PathNode, Paths, PathsError};

impl Paths {
    /// Renders the registry as an indented tree, one line per element:
    /// the element's last segment, then `: #name`, indented two spaces per
    /// ancestor. Parentless elements each root their own subtree; children
    /// print depth-first in registration order. Elements whose parent is
    /// unregistered are unreachable and omitted (they surface through
    /// [`get_errors`](Self::get_errors) instead).
    pub fn to_tree(&self) -> Result<String, PathsError> {
        let mut roots: Vec<&str> = Vec::new();
        let mut children: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for (name, node) in &self.nodes {
            let parent = match node {
                PathNode::Element { parent, .. } => parent,
                PathNode::Generator { parent, .. } => parent,
            };
            match parent.as_deref() {
                Some(parent) => children.entry(parent).or_default().push(name),
                None => roots.push(name),
            }
        }

        let mut out = String::new();
        for root in roots {
            self.render(root, 0, &children, &mut out)?;
        }
        Ok(out)
    }

    fn render(
        &self,
        name: &str,
        depth: usize,
        children: &IndexMap<&str, Vec<&str>>,
        out: &mut String,
    ) -> Result<(), PathsError> {
        let Some(node) = self.nodes.get(name) else {
            return Ok(());
        };
        let (segments, is_root) = match node {
            PathNode::Element { value, is_root, .. } => (value.clone(), *is_root),
            PathNode::Generator {
                generate, is_root, ..
            } => (generate(self)?.0, *is_root),
        };

        for _ in 0..depth {
            out.push_str("  ");
        }
        if is_root {
            out.push(MAIN_SEPARATOR);
        }
        out.push_str(segments.last().map(String::as_str).unwrap_or(""));
        out.push_str(": #");
        out.push_str(name);
        out.push('\n');

        if let Some(kids) = children.get(name) {
            for kid in kids {
                self.render(kid, depth + 1, children, out)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::Segments;

    #[test]
    fn test_empty_registry() {
        let paths = Paths::new();
        assert_eq!(paths.to_tree().unwrap(), "");
    }

    #[test]
    fn test_single_root() {
        let mut paths = Paths::new();
        paths.set("n", "v", None, false);
        assert_eq!(paths.to_tree().unwrap(), "v: #n\n");
    }

    #[test]
    fn test_root_flag_prefixes_separator() {
        let mut paths = Paths::new();
        paths.set("n", "v", None, true);
        assert_eq!(
            paths.to_tree().unwrap(),
            format!("{}v: #n\n", MAIN_SEPARATOR)
        );
    }

    #[test]
    fn test_nested_indentation() {
        let mut paths = Paths::new();
        paths.set("top", "top", None, false);
        paths.set("mid", "mid", Some("top"), false);
        paths.set("leaf", "leaf.txt", Some("mid"), false);
        assert_eq!(
            paths.to_tree().unwrap(),
            "top: #top\n  mid: #mid\n    leaf.txt: #leaf\n"
        );
    }

    #[test]
    fn test_multi_segment_shows_basename() {
        let mut paths = Paths::new();
        paths.set("deep", vec!["a", "b", "c"], None, false);
        assert_eq!(paths.to_tree().unwrap(), "c: #deep\n");
    }

    #[test]
    fn test_children_in_registration_order() {
        let mut paths = Paths::new();
        paths.set("top", "top", None, false);
        paths.set("zeta", "z", Some("top"), false);
        paths.set("alpha", "a", Some("top"), false);
        assert_eq!(
            paths.to_tree().unwrap(),
            "top: #top\n  z: #zeta\n  a: #alpha\n"
        );
    }

    #[test]
    fn test_each_parentless_element_roots_a_subtree() {
        let mut paths = Paths::new();
        paths.set("one", "one", None, false);
        paths.set("two", "two", None, false);
        paths.set("kid", "kid", Some("one"), false);
        assert_eq!(
            paths.to_tree().unwrap(),
            "one: #one\n  kid: #kid\ntwo: #two\n"
        );
    }

    #[test]
    fn test_orphans_are_omitted() {
        let mut paths = Paths::new();
        paths.set("ok", "ok", None, false);
        paths.set("orphan", "x", Some("gone"), false);
        assert_eq!(paths.to_tree().unwrap(), "ok: #ok\n");
    }

    #[test]
    fn test_generator_element_renders_its_segments() {
        let mut paths = Paths::new();
        paths.set_generator("gen", |_| Ok(Segments::from(["a", "b"])), None, false);
        assert_eq!(paths.to_tree().unwrap(), "b: #gen\n");
    }

    #[test]
    fn test_generator_failure_propagates() {
        let mut paths = Paths::new();
        paths.set_generator(
            "broken",
            |_| Err(PathsError::Generator("boom".to_string())),
            None,
            false,
        );
        assert!(paths.to_tree().is_err());
    }
}
