//! Drives a build: first pass per file, link fixing and assembly.
//!
//! Files are fed one at a time with [`Bundler::add_file`]. Each call runs the
//! complete first pass for that file (wrap, rewrite, library scan, tree
//! insertion) before the record joins the file list, so a failing file never
//! leaves partial output behind. [`Bundler::finish`] consumes the bundler;
//! the link fixer therefore only ever sees the complete file list.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::info;

use crate::{
    assembler,
    file_record::{FileRecord, SourceFile},
    iife_wrapper, link_fixer,
    namespace_tree::{LeafKind, NamespaceTree},
    statement_rewriter::{RewriteOptions, rewrite_file},
};

/// Default name of the concatenated output file.
pub const DEFAULT_OUTPUT: &str = "core.js";

#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Output file name, placed in the project root.
    pub output: String,
    /// Text prepended to the bundle, followed by a newline.
    pub header: Option<String>,
    /// Text appended verbatim to the bundle.
    pub footer: Option<String>,
    pub rewrite: RewriteOptions,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            output: DEFAULT_OUTPUT.to_owned(),
            header: None,
            footer: None,
            rewrite: RewriteOptions::default(),
        }
    }
}

/// Accumulates rewritten files and the namespace tree of one build.
#[derive(Debug)]
pub struct Bundler {
    options: BundleOptions,
    /// Fixed by the first file added.
    root: Option<PathBuf>,
    files: Vec<FileRecord>,
    tree: NamespaceTree,
}

impl Bundler {
    pub fn new(options: BundleOptions) -> Self {
        Self {
            options,
            root: None,
            files: Vec::new(),
            tree: NamespaceTree::new(),
        }
    }

    /// A bundler whose project root is fixed up front instead of being taken
    /// from the first file.
    pub fn with_root(options: BundleOptions, root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::new(options)
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    /// Run the first pass over `source` and keep the result.
    pub fn add_file(&mut self, source: SourceFile) -> Result<()> {
        let root = self
            .root
            .get_or_insert_with(|| source.cwd.clone())
            .clone();
        let hyphens = self.options.rewrite.hyphens;

        let mut record = FileRecord::for_source(&root, &source, hyphens);
        let path = record.relative_path();
        record.contents = iife_wrapper::wrap(source.contents.as_slice())
            .with_context(|| format!("Failed to wrap {}", path.display()))?;
        rewrite_file(&mut record, &self.options.rewrite)
            .with_context(|| format!("Failed to rewrite {}", path.display()))?;

        let kind = if record.lib.name().is_some() {
            LeafKind::Library
        } else {
            LeafKind::Namespace
        };
        let tree_path = record.tree_path(hyphens);
        self.tree.insert(&tree_path, kind);

        match record.lib.name() {
            Some(name) => info!(
                "Processed {} (embedded library '{name}' at {tree_path})",
                path.display()
            ),
            None => info!("Processed {} as {tree_path}", path.display()),
        }
        self.files.push(record);
        Ok(())
    }

    /// Fix library links across all files and assemble the bundle.
    pub fn finish(self) -> Result<Bundle> {
        let Self {
            options,
            root,
            mut files,
            tree,
        } = self;
        let root = root.unwrap_or_default();
        let sources = files.len();

        let fixed = link_fixer::fix_links(&mut files);
        assembler::prepend_tree_file(&mut files, &root, &tree)?;
        assembler::apply_header_footer(
            &mut files,
            options.header.as_deref(),
            options.footer.as_deref(),
        );

        let output_path = root.join(&options.output);
        info!(
            "Bundled {sources} files into {} ({fixed} library links fixed)",
            output_path.display()
        );
        Ok(Bundle { output_path, files })
    }
}

/// The assembled file list, `tree.js` first.
#[derive(Debug)]
pub struct Bundle {
    /// `<root>/<output>`.
    pub output_path: PathBuf,
    pub files: Vec<FileRecord>,
}

impl Bundle {
    /// The concatenated bundle text.
    pub fn contents(&self) -> String {
        assembler::concatenate(&self.files)
    }

    /// Write the bundle to [`Bundle::output_path`].
    pub fn write(&self) -> Result<()> {
        fs::write(&self.output_path, self.contents())
            .with_context(|| format!("Failed to write {}", self.output_path.display()))
    }
}
