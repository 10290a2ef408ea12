//! Collects the module files of a project.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{debug, trace};
use walkdir::WalkDir;

use crate::types::FxIndexSet;

/// Find every file below the `src` entries (relative to `root`) whose
/// extension is one of `extensions`.
///
/// Directories are walked in file-name order so that the arrival order of
/// files is stable between runs. Entries naming a file are taken as-is.
/// Files reachable from more than one entry are returned once.
pub fn collect_sources(root: &Path, src: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = FxIndexSet::default();

    for entry in src {
        let path = root.join(entry);
        if path.is_file() {
            found.insert(path);
            continue;
        }
        if !path.is_dir() {
            bail!("Source path {} does not exist", path.display());
        }

        debug!("Scanning {}", path.display());
        for item in WalkDir::new(&path).sort_by_file_name() {
            let item = item.with_context(|| format!("Failed to scan {}", path.display()))?;
            if !item.file_type().is_file() || !has_extension(item.path(), extensions) {
                continue;
            }
            trace!("Found {}", item.path().display());
            found.insert(item.into_path());
        }
    }

    Ok(found.into_iter().collect())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .is_some_and(|ext| extensions.iter().any(|known| ext == known.as_str()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn create_test_file(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn js() -> Vec<String> {
        vec!["js".to_owned()]
    }

    #[test]
    fn test_collects_sorted_js_files() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(&root.join("src/b.js"), "")?;
        create_test_file(&root.join("src/a/z.js"), "")?;
        create_test_file(&root.join("src/a/y.js"), "")?;
        create_test_file(&root.join("src/readme.md"), "")?;
        create_test_file(&root.join("other/c.js"), "")?;

        let files = collect_sources(root, &[PathBuf::from("src")], &js())?;
        let relative: Vec<PathBuf> = files
            .iter()
            .map(|file| file.strip_prefix(root).map(Path::to_path_buf))
            .collect::<Result<_, std::path::StripPrefixError>>()?;

        assert_eq!(
            relative,
            vec![
                PathBuf::from("src/a/y.js"),
                PathBuf::from("src/a/z.js"),
                PathBuf::from("src/b.js"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_duplicates_are_dropped() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(&root.join("src/a.js"), "")?;
        create_test_file(&root.join("src/lib/b.js"), "")?;

        let files = collect_sources(
            root,
            &[PathBuf::from("src/lib/b.js"), PathBuf::from("src")],
            &js(),
        )?;

        assert_eq!(files, vec![root.join("src/lib/b.js"), root.join("src/a.js")]);
        Ok(())
    }

    #[test]
    fn test_missing_source_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let err = collect_sources(temp_dir.path(), &[PathBuf::from("nope")], &js())
            .expect_err("missing directory should fail");
        assert!(err.to_string().starts_with("Source path"));
        Ok(())
    }

    #[test]
    fn test_custom_extensions() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        create_test_file(&root.join("src/a.js"), "")?;
        create_test_file(&root.join("src/b.mjs"), "")?;

        let files = collect_sources(root, &[PathBuf::from("src")], &["mjs".to_owned()])?;
        assert_eq!(files, vec![root.join("src/b.mjs")]);
        Ok(())
    }
}
