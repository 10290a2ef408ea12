//! Input files and the per-module records built from them.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::warn;

use crate::{
    embedded_lib::LibraryState,
    namespace::{HyphenMode, NamespacePath},
    statement_rewriter::PendingLink,
};

/// A raw input file as handed over by the traversal collaborator.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Directory the file path is relative to; the first file's `cwd` becomes
    /// the project root for the whole run.
    pub cwd: PathBuf,
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn new(cwd: impl Into<PathBuf>, path: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            cwd: cwd.into(),
            path: path.into(),
            contents,
        }
    }

    /// Read `path` from disk.
    pub fn read(cwd: &Path, path: &Path) -> Result<Self> {
        let contents =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::new(cwd, path, contents))
    }
}

/// One module flowing through the rewriting passes.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Project root all other paths are relative to.
    pub root: PathBuf,
    /// Directory of the file, relative to `root`.
    pub dir: PathBuf,
    /// File name with extension (`d.js`).
    pub base: String,
    /// Extension including the dot (`.js`), empty when there is none.
    pub ext: String,
    /// File name without extension (`d`).
    pub name: String,
    /// `name` with hyphens stripped; the key of this module in the tree.
    pub forname: String,
    pub contents: String,
    pub lib: LibraryState,
    /// Imports that may target an embedded library, resolved after all files
    /// went through the first pass.
    pub pending_links: Vec<PendingLink>,
}

impl FileRecord {
    /// Build a record for `source`, located relative to `root`.
    pub fn for_source(root: &Path, source: &SourceFile, hyphens: HyphenMode) -> Self {
        let absolute = source.cwd.join(&source.path);
        let relative = match absolute.strip_prefix(root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => {
                warn!(
                    "{} is outside the project root {}",
                    absolute.display(),
                    root.display()
                );
                source.path.clone()
            }
        };
        Self::from_relative(root, &relative, hyphens)
    }

    /// Split `relative` into `dir`, `base`, `ext` and `name`.
    pub fn from_relative(root: &Path, relative: &Path, hyphens: HyphenMode) -> Self {
        let dir = relative.parent().map(Path::to_path_buf).unwrap_or_default();
        let base = file_part(relative.file_name());
        let name = file_part(relative.file_stem());
        let ext = relative
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let forname = hyphens.normalize_segment(&name).into_owned();

        Self {
            root: root.to_path_buf(),
            dir,
            base,
            ext,
            name,
            forname,
            contents: String::new(),
            lib: LibraryState::default(),
            pending_links: Vec::new(),
        }
    }

    /// A generated file living at the project root.
    pub fn synthetic(root: &Path, base: &str, contents: String) -> Self {
        let mut record = Self::from_relative(root, Path::new(base), HyphenMode::default());
        record.contents = contents;
        record
    }

    /// Path relative to the project root.
    pub fn relative_path(&self) -> PathBuf {
        self.dir.join(&self.base)
    }

    pub fn is_library(&self) -> bool {
        !self.lib.is_unseen()
    }

    /// Namespace of the directory holding this file.
    pub fn directory_namespace(&self, hyphens: HyphenMode) -> NamespacePath {
        NamespacePath::for_directory(&self.dir, hyphens)
    }

    /// Namespace this module exports onto: directory plus `forname`.
    pub fn module_namespace(&self, hyphens: HyphenMode) -> NamespacePath {
        let mut path = self.directory_namespace(hyphens);
        path.push(self.forname.clone());
        path
    }

    /// Path under which this file appears in the tree. Embedded libraries use
    /// their exported name once it is known.
    pub fn tree_path(&self, hyphens: HyphenMode) -> NamespacePath {
        match self.lib.name() {
            Some(name) => NamespacePath::for_module(&self.dir, name, hyphens),
            None => self.module_namespace(hyphens),
        }
    }
}

fn file_part(part: Option<&std::ffi::OsStr>) -> String {
    part.map(|part| part.to_string_lossy().into_owned())
        .unwrap_or_default()
}
