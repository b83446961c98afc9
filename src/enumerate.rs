//! Lazy, single-pass enumeration of relative paths under a root.

use std::path::Path;

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::error::Result;
use crate::relpath::RelativePath;

/// Directory names excluded from every enumeration unless the caller supplies
/// its own set.
pub fn default_excludes() -> Vec<String> {
    ["obj", "bin", ".vs", ".vscode", ".git"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Walk `root` recursively, yielding every regular file as a [`RelativePath`].
///
/// `excludes` names directories to skip, matched case-insensitively against
/// any path component (not just the top-level one). Entries that can't be
/// read (permission errors, broken symlinks) are silently skipped, matching
/// the walker contract in the spec: order is unspecified but deterministic
/// within a single walk of an unchanging filesystem.
pub fn enumerate(
    root: &Path,
    excludes: &[String],
) -> Result<impl Iterator<Item = RelativePath>> {
    let mut overrides = OverrideBuilder::new(root);
    overrides.case_insensitive(true)?;
    for name in excludes {
        overrides.add(&format!("!{name}"))?;
        overrides.add(&format!("!**/{name}/**"))?;
    }
    let overrides = overrides.build()?;

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .overrides(overrides);

    let root = root.to_path_buf();
    Ok(builder.build().filter_map(move |entry| {
        let entry = entry.ok()?;
        let file_type = entry.file_type()?;
        if !file_type.is_file() {
            return None;
        }
        RelativePath::strip_root(entry.path(), &root)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn yields_files_and_skips_excluded_dirs() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("src/main.rs"), b"fn main() {}").unwrap();
        fs::write(dir.path().join("bin/artifact.exe"), b"binary").unwrap();

        let found: Vec<_> = enumerate(dir.path(), &default_excludes())
            .unwrap()
            .map(|p| p.as_str().to_string())
            .collect();

        assert_eq!(found, vec!["src/main.rs".to_string()]);
    }

    #[test]
    fn exclusion_matching_is_case_insensitive() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Bin")).unwrap();
        fs::write(dir.path().join("Bin/artifact.exe"), b"binary").unwrap();

        let found: Vec<_> = enumerate(dir.path(), &default_excludes()).unwrap().collect();
        assert!(found.is_empty());
    }

    #[test]
    fn empty_root_yields_nothing() {
        let dir = tempdir().unwrap();
        let found: Vec<_> = enumerate(dir.path(), &default_excludes()).unwrap().collect();
        assert!(found.is_empty());
    }
}
