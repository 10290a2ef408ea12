//! Final assembly of a bundle: the generated `tree.js`, header and footer
//! injection and concatenation.

use std::path::Path;

use anyhow::Result;
use log::debug;

use crate::{
    file_record::FileRecord, namespace::TREE_JSON_TAG, namespace_tree::NamespaceTree,
    util::push_line,
};

/// Base name of the generated namespace-declaration file.
pub const TREE_FILE_NAME: &str = "tree.js";

/// Declares the tree object and the `extend` helper used by every module.
const PREAMBLE: [&str; 9] = [
    "  /* ***************************************************************************",
    "   *",
    "   * Tree is an object that links all the internal IIFE modules.",
    "   *",
    "   * ************************************************************************ */",
    "  /* eslint-disable-next-line */",
    "  let $__TREE = {{$__tree:json}};",
    "  /* eslint-disable-next-line */",
    "  $__TREE.extend=function(o,m){var k=Object.keys(m);for(var i=0;i<k.length;i++){o[k[i]]=m[k[i]]}};",
];

/// Contents of `tree.js` for `tree`.
pub fn tree_file_contents(tree: &NamespaceTree) -> Result<String> {
    let json = tree.to_json()?;
    let mut contents = String::new();
    for line in PREAMBLE {
        push_line(&mut contents, line);
    }
    contents.push('\n');
    Ok(contents.replacen(TREE_JSON_TAG, &json, 1))
}

/// Put the generated `tree.js` in front of `files`.
pub fn prepend_tree_file(
    files: &mut Vec<FileRecord>,
    root: &Path,
    tree: &NamespaceTree,
) -> Result<()> {
    let record = FileRecord::synthetic(root, TREE_FILE_NAME, tree_file_contents(tree)?);
    files.insert(0, record);
    Ok(())
}

/// Prepend `header` (plus a newline) to the first file and append `footer`
/// verbatim to the last one.
pub fn apply_header_footer(files: &mut [FileRecord], header: Option<&str>, footer: Option<&str>) {
    if let (Some(header), Some(first)) = (header, files.first_mut()) {
        debug!("Adding header to {}", first.base);
        first.contents = format!("{header}\n{}", first.contents);
    }
    if let (Some(footer), Some(last)) = (footer, files.last_mut()) {
        debug!("Adding footer to {}", last.base);
        last.contents.push_str(footer);
    }
}

/// Concatenate the contents of `files` in order.
pub fn concatenate(files: &[FileRecord]) -> String {
    let mut bundle = String::with_capacity(files.iter().map(|file| file.contents.len()).sum());
    for file in files {
        bundle.push_str(&file.contents);
    }
    bundle
}
