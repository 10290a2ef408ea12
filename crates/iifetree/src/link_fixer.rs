//! Second pass: retarget imports of embedded libraries at their real names.
//!
//! During the first pass an import of `src/lib/messenger.js` is rendered
//! against the file-derived path `$__TREE.src.lib.messenger`, because the
//! library may not have been scanned yet. Once every file went through the
//! first pass, each recorded [`PendingLink`] whose file-derived link is a library is
//! rewritten against the exported name, e.g. `$__TREE.src.lib.Messenger`.

use log::{debug, warn};

use crate::{
    file_record::FileRecord,
    namespace::NamespacePath,
    statement_rewriter::PendingLink,
    types::FxIndexMap,
    util::push_line,
};

/// Library links discovered during the first pass, mapped to exported names.
#[derive(Debug, Default)]
pub struct LibraryTable {
    names: FxIndexMap<NamespacePath, String>,
}

impl LibraryTable {
    pub fn from_files(files: &[FileRecord]) -> Self {
        let mut names = FxIndexMap::default();
        for library in files.iter().filter_map(|file| file.lib.library()) {
            names
                .entry(library.link.clone())
                .or_insert_with(|| library.name.clone());
        }
        Self { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Exported name of the library published at `link`.
    pub fn name(&self, link: &NamespacePath) -> Option<&str> {
        self.names.get(link).map(String::as_str)
    }
}

/// Resolve the pending links of every ordinary module against the libraries
/// found in `files`. Returns the number of rewritten lines.
///
/// Files that are themselves (possibly incomplete) embedded libraries are
/// left alone. Resolved links are removed from their file, so running the
/// pass again is a no-op.
pub fn fix_links(files: &mut [FileRecord]) -> usize {
    let table = LibraryTable::from_files(files);
    if table.is_empty() {
        return 0;
    }
    debug!("Fixing links against {} embedded libraries", table.len());

    files
        .iter_mut()
        .filter(|file| file.lib.is_unseen())
        .map(|file| fix_file(file, &table))
        .sum()
}

fn fix_file(file: &mut FileRecord, table: &LibraryTable) -> usize {
    if file.pending_links.is_empty() {
        return 0;
    }

    let mut lines: Vec<String> = file.contents.lines().map(str::to_owned).collect();
    let mut unresolved = Vec::new();
    let mut fixed = 0;

    for pending in std::mem::take(&mut file.pending_links) {
        let Some(name) = table.name(&pending.import.link()) else {
            unresolved.push(pending);
            continue;
        };
        let PendingLink { line_index, import } = &pending;
        let expected = import.to_string();
        match lines.get_mut(*line_index) {
            Some(line) if *line == expected => {
                let relinked = import.relink(name).to_string();
                debug!(
                    "{}:{}: {} -> {}",
                    file.relative_path().display(),
                    line_index + 1,
                    line.trim(),
                    relinked.trim()
                );
                *line = relinked;
                fixed += 1;
            }
            _ => warn!(
                "{}:{}: expected '{}' while linking library '{name}', line left unchanged",
                file.relative_path().display(),
                line_index + 1,
                expected.trim()
            ),
        }
    }

    file.pending_links = unresolved;
    if fixed > 0 {
        let mut contents = String::with_capacity(file.contents.len());
        for line in &lines {
            push_line(&mut contents, line);
        }
        file.contents = contents;
    }
    fixed
}
