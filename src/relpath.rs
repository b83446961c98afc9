//! A path relative to a repository root, compared case-insensitively.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// A path relative to a source or destination root, stored with forward
/// slashes regardless of host platform.
///
/// Equality and ordering are case-insensitive on the full string, matching
/// the way destination filenames are keyed in the [`crate::dest_index`].
#[derive(Debug, Clone)]
pub struct RelativePath(String);

impl RelativePath {
    /// Build a `RelativePath` from a string, normalizing `\` to `/`.
    pub fn new(s: impl Into<String>) -> Self {
        let s: String = s.into();
        Self(s.replace('\\', "/"))
    }

    /// Build a `RelativePath` from `full` by stripping the `root` prefix.
    pub fn strip_root(full: &Path, root: &Path) -> Option<Self> {
        let rel = full.strip_prefix(root).ok()?;
        Some(Self::new(rel.to_string_lossy().into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path component, purely lexical (no filesystem access).
    pub fn basename(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Non-empty path components, in source order (root-to-leaf).
    pub fn components(&self) -> Vec<&str> {
        self.0.split('/').filter(|c| !c.is_empty()).collect()
    }

    /// Join this relative path onto a host root, using the platform separator.
    pub fn to_host_path(&self, root: &Path) -> PathBuf {
        let mut buf = root.to_path_buf();
        for component in self.components() {
            buf.push(component);
        }
        buf
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for RelativePath {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for RelativePath {}

impl Hash for RelativePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.0.chars() {
            c.to_ascii_lowercase().hash(state);
        }
    }
}

impl PartialOrd for RelativePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RelativePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.to_ascii_lowercase().cmp(&other.0.to_ascii_lowercase())
    }
}
