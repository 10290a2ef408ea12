//! Namespace naming utilities.
//!
//! This module turns filesystem paths into the dotted property paths that the
//! rewritten modules use to reach each other through the shared tree object,
//! e.g. `src/util-a/b.js` becomes `$__TREE.src.utila.b`.

use std::{
    borrow::Cow,
    fmt,
    path::{Component, Path},
};

use cow_utils::CowUtils;
use serde::Deserialize;

/// Name of the global object every rewritten module publishes onto.
pub const TREE: &str = "$__TREE";

/// Placeholder in the generated preamble replaced by the serialized tree.
pub const TREE_JSON_TAG: &str = "{{$__tree:json}}";

/// Placeholder inside an embedded library replaced by its parent namespace.
pub const LIB_PARENT_TAG: &str = "{{lib:parent}}";

/// How hyphens are removed from path segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HyphenMode {
    /// Remove every hyphen of a segment.
    #[default]
    All,
    /// Remove only the first hyphen of a segment (legacy output).
    First,
}

impl HyphenMode {
    /// Strip hyphens from a single path segment.
    pub fn normalize_segment(self, segment: &str) -> Cow<'_, str> {
        match self {
            Self::All => segment.cow_replace("-", ""),
            Self::First => match segment.find('-') {
                Some(pos) => Cow::Owned(format!("{}{}", &segment[..pos], &segment[pos + 1..])),
                None => Cow::Borrowed(segment),
            },
        }
    }

    /// Normalize an ordered sequence of path segments.
    ///
    /// The output has the same length and order as the input; only hyphens are
    /// removed.
    pub fn normalize<I, S>(self, segments: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        segments
            .into_iter()
            .map(|segment| self.normalize_segment(segment.as_ref()).into_owned())
            .collect()
    }
}

/// Split a relative path into its segments, resolving `.` and `..` lexically.
///
/// Leading `..` segments that cannot be resolved are kept as-is. Root and
/// prefix components are ignored, so the result is always relative.
pub fn path_segments(path: &Path) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                if segments.last().is_some_and(|last| last != "..") {
                    segments.pop();
                } else {
                    segments.push("..".to_owned());
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    segments
}

/// A fully-qualified property path below [`TREE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NamespacePath {
    segments: Vec<String>,
}

impl NamespacePath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Namespace of a directory relative to the project root.
    pub fn for_directory(dir: &Path, mode: HyphenMode) -> Self {
        Self::new(mode.normalize(path_segments(dir)))
    }

    /// Namespace of a module: its directory followed by `key`.
    pub fn for_module(dir: &Path, key: &str, mode: HyphenMode) -> Self {
        let mut path = Self::for_directory(dir, mode);
        path.push(mode.normalize_segment(key).into_owned());
        path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn push(&mut self, segment: String) {
        self.segments.push(segment);
    }

    /// The path without its last segment.
    #[must_use]
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// The same path with the last segment replaced by `name`.
    #[must_use]
    pub fn with_last(&self, name: &str) -> Self {
        let mut path = self.parent();
        path.push(name.to_owned());
        path
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(TREE)?;
        for segment in &self.segments {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_normalize_strips_every_hyphen() {
        let normalized = HyphenMode::All.normalize(["src", "util-a", "my-long-name"]);
        assert_eq!(normalized, vec!["src", "utila", "mylongname"]);
    }

    #[test]
    fn test_normalize_legacy_strips_first_hyphen_only() {
        let normalized = HyphenMode::First.normalize(["util-a", "my-long-name"]);
        assert_eq!(normalized, vec!["utila", "mylong-name"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            vec!["a-b-c", "plain", ""],
            vec!["--", "x-", "-y"],
            vec!["src", "utilB", "util-C"],
        ];
        for input in inputs {
            let once = HyphenMode::All.normalize(&input);
            let twice = HyphenMode::All.normalize(&once);
            assert_eq!(once, twice, "normalizing {input:?} twice changed the result");
        }
    }

    #[test]
    fn test_normalize_borrows_when_unchanged() {
        assert!(matches!(
            HyphenMode::All.normalize_segment("plain"),
            Cow::Borrowed("plain")
        ));
        assert!(matches!(
            HyphenMode::First.normalize_segment("plain"),
            Cow::Borrowed("plain")
        ));
    }

    #[test]
    fn test_path_segments_resolves_dots() {
        assert_eq!(
            path_segments(&PathBuf::from("src/util/../lib/./a.js")),
            vec!["src", "lib", "a.js"]
        );
        assert_eq!(path_segments(&PathBuf::from("../x")), vec!["..", "x"]);
        assert!(path_segments(&PathBuf::new()).is_empty());
    }

    #[test]
    fn test_namespace_path_display() {
        let path = NamespacePath::for_module(&PathBuf::from("src/util-2"), "d", HyphenMode::All);
        assert_eq!(path.to_string(), "$__TREE.src.util2.d");
        assert_eq!(path.parent().to_string(), "$__TREE.src.util2");
        assert_eq!(path.with_last("D").to_string(), "$__TREE.src.util2.D");
        assert_eq!(NamespacePath::default().to_string(), "$__TREE");
    }

    #[test]
    fn test_module_at_root_has_no_empty_segment() {
        let path = NamespacePath::for_module(&PathBuf::new(), "main", HyphenMode::All);
        assert_eq!(path.to_string(), "$__TREE.main");
    }
}
