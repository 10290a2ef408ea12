//! Rewrites `import`/`export default` lines into namespace tree accesses.
//!
//! Only two single-line shapes are recognized; this is deliberately not a
//! JavaScript parser. Tokens are obtained by trimming the line and splitting
//! it on single spaces.
//!
//! ```text
//! import NAME from PATH[;]        ->  const NAME = $__TREE.<resolved path>;
//!                                     const { NAME } = $__TREE.<parent path>;
//! export default IDENT[;]         ->  $__TREE.extend(<own path>, { IDENT });
//! export default { A, B }[;]      ->  $__TREE.extend(<own path>, { A, B });
//! ```
//!
//! Every other line passes through unchanged.

use std::{fmt, path::Path};

use anyhow::{Context, Result};
use log::{debug, trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    file_record::FileRecord,
    namespace::{HyphenMode, NamespacePath, TREE, path_segments},
    util::{self, indentation, push_line},
};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid"));

/// Options shared by every module of a run.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    pub hyphens: HyphenMode,
    /// Extensions (without dot) stripped from import targets.
    pub extensions: Vec<String>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            hyphens: HyphenMode::default(),
            extensions: vec!["js".to_owned()],
        }
    }
}

/// How an import binds its local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// `const NAME = path.NAME_OR_OTHER;`
    Plain(String),
    /// `const { NAME } = path;`
    Destructured(String),
}

impl Binding {
    pub fn local_name(&self) -> &str {
        match self {
            Self::Plain(name) | Self::Destructured(name) => name,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(name) => f.write_str(name),
            Self::Destructured(name) => write!(f, "{{ {name} }}"),
        }
    }
}

/// A rewritten `import` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    indent: String,
    binding: Binding,
    /// The namespace path read by the statement, as emitted.
    target: NamespacePath,
    /// Tokens after the path, kept verbatim.
    trailing: String,
}

impl ImportStatement {
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn target(&self) -> &NamespacePath {
        &self.target
    }

    /// The file-derived path this import reads, before destructuring: the
    /// target itself for a plain binding, the target plus the local name for
    /// a destructured one.
    pub fn link(&self) -> NamespacePath {
        match &self.binding {
            Binding::Plain(_) => self.target.clone(),
            Binding::Destructured(local) => {
                let mut link = self.target.clone();
                link.push(local.clone());
                link
            }
        }
    }

    /// Retarget this import at an embedded library exporting `library_name`.
    ///
    /// [`ImportStatement::link`] is the file-derived path of the library. When
    /// the local name equals the library name the import destructures the
    /// library's parent namespace, otherwise the last segment becomes the
    /// library name.
    #[must_use]
    pub fn relink(&self, library_name: &str) -> Self {
        let local = self.binding.local_name();
        let link = self.link();
        let (binding, target) = if local == library_name {
            (Binding::Destructured(local.to_owned()), link.parent())
        } else {
            (Binding::Plain(local.to_owned()), link.with_last(library_name))
        };
        Self {
            indent: self.indent.clone(),
            binding,
            target,
            trailing: self.trailing.clone(),
        }
    }
}

impl fmt::Display for ImportStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}const {} = {};{}",
            self.indent, self.binding, self.target, self.trailing
        )
    }
}

/// A rewritten `export default` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportStatement {
    indent: String,
    module: NamespacePath,
    /// Object literal passed to `extend`, e.g. `{ A, B }`.
    members: String,
    trailing: String,
}

impl fmt::Display for ExportStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{TREE}.extend({}, {});{}",
            self.indent, self.module, self.members, self.trailing
        )
    }
}

/// An import emitted during the first pass whose target may be an embedded
/// library discovered later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLink {
    /// Zero-based index of the line in the rewritten contents.
    pub line_index: usize,
    pub import: ImportStatement,
}

/// Per-module information needed to rewrite its lines.
#[derive(Debug, Clone)]
pub struct ModuleContext<'a> {
    /// Directory of the module relative to the project root.
    pub dir: &'a Path,
    /// Namespace the module exports onto.
    pub module: NamespacePath,
    /// Namespace of the module's directory.
    pub directory: NamespacePath,
    pub options: &'a RewriteOptions,
}

impl<'a> ModuleContext<'a> {
    pub fn new(record: &'a FileRecord, options: &'a RewriteOptions) -> Self {
        Self {
            dir: &record.dir,
            module: record.module_namespace(options.hyphens),
            directory: record.directory_namespace(options.hyphens),
            options,
        }
    }
}

/// Recognize `import NAME from PATH`.
pub fn parse_import(line: &str, ctx: &ModuleContext<'_>) -> Option<ImportStatement> {
    if !line.contains("import") || !line.contains("from") {
        return None;
    }
    let tokens: Vec<&str> = line.trim().split(' ').collect();
    let ["import", local, "from", source, rest @ ..] = tokens.as_slice() else {
        return None;
    };
    if local.is_empty() {
        return None;
    }

    let source = source.replacen(';', "", 1).replace(['\'', '"'], "");
    let target = resolve_import_target(ctx, &source)?;
    let last = target.last()?;

    let (binding, target) = if *local == last {
        (Binding::Destructured((*local).to_owned()), target.parent())
    } else {
        (Binding::Plain((*local).to_owned()), target)
    };

    Some(ImportStatement {
        indent: indentation(line).to_owned(),
        binding,
        target,
        trailing: trailing_tokens(rest),
    })
}

/// Resolve an import source against the module directory into a namespace
/// path, dropping a known file extension from the last segment.
fn resolve_import_target(ctx: &ModuleContext<'_>, source: &str) -> Option<NamespacePath> {
    let mut segments = path_segments(&ctx.dir.join(source));
    let last = segments.last_mut()?;
    if let Some((stem, ext)) = last.rsplit_once('.')
        && !stem.is_empty()
        && ctx.options.extensions.iter().any(|known| known == ext)
    {
        *last = stem.to_owned();
    }
    Some(NamespacePath::new(ctx.options.hyphens.normalize(segments)))
}

/// Recognize `export default IDENT` and `export default { ... }`.
pub fn parse_export(line: &str, ctx: &ModuleContext<'_>) -> Option<ExportStatement> {
    if !line.contains("export") || !line.contains("default") {
        return None;
    }
    let trimmed = line.trim();
    let tokens: Vec<&str> = trimmed.split(' ').collect();
    let &["export", "default", value, ..] = tokens.as_slice() else {
        return None;
    };

    let (members, trailing) = if tokens.len() == 3 && !value.starts_with('{') {
        let ident = value.strip_suffix(';').unwrap_or(value);
        if !IDENTIFIER.is_match(ident) {
            return None;
        }
        (format!("{{ {ident} }}"), String::new())
    } else {
        let literal = trimmed.strip_prefix("export default")?.trim_start();
        object_literal(literal)?
    };

    Some(ExportStatement {
        indent: indentation(line).to_owned(),
        module: ctx.module.clone(),
        members,
        trailing,
    })
}

/// Split `{ A, B }; rest` into a normalized literal and the trailing text.
/// Nested braces are kept; unbalanced braces yield `None`.
fn object_literal(text: &str) -> Option<(String, String)> {
    if !text.starts_with('{') {
        return None;
    }
    let close = matching_brace(text)?;
    let inner = text[1..close].trim();
    let members = if inner.is_empty() {
        "{}".to_owned()
    } else {
        format!("{{ {inner} }}")
    };
    Some((members, trailing_text(&text[close + 1..])))
}

/// Byte offset of the `}` closing the `{` at the start of `text`.
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
    }
    None
}

/// Text following a statement, without its terminating `;`, as ` rest` or
/// an empty string.
fn trailing_text(rest: &str) -> String {
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(';').unwrap_or(rest).trim();
    if rest.is_empty() {
        String::new()
    } else {
        format!(" {rest}")
    }
}

fn trailing_tokens(rest: &[&str]) -> String {
    trailing_text(&rest.join(" "))
}

/// Result of rewriting one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRewrite {
    Import(ImportStatement),
    Export(ExportStatement),
    Library(String),
    Unchanged,
}

/// Run the first pass over a wrapped module: statement rewriting and embedded
/// library detection, interleaved line by line.
///
/// All three matchers see every line; the emitted line follows the priority
/// import > export > embedded library.
pub fn rewrite_file(record: &mut FileRecord, options: &RewriteOptions) -> Result<()> {
    let mut lib = std::mem::take(&mut record.lib);
    let ctx = ModuleContext::new(record, options);
    let mut pending_links = Vec::new();
    let mut out = String::with_capacity(record.contents.len());

    for (line_index, line) in util::lines(record.contents.as_bytes()).enumerate() {
        let line = line.with_context(|| format!("Failed to rewrite {}", record.base))?;
        let import = parse_import(&line, &ctx);
        let export = parse_export(&line, &ctx);
        let library = lib.scan_line(&line, &ctx.directory, &ctx.module);

        let rewrite = match (import, export, library) {
            (Some(import), _, _) => LineRewrite::Import(import),
            (None, Some(export), _) => LineRewrite::Export(export),
            (None, None, Some(library)) => LineRewrite::Library(library),
            (None, None, None) => LineRewrite::Unchanged,
        };

        match rewrite {
            LineRewrite::Import(import) => {
                debug!("{}: {} -> {import}", record.base, line.trim());
                push_line(&mut out, &import.to_string());
                pending_links.push(PendingLink { line_index, import });
            }
            LineRewrite::Export(export) => {
                debug!("{}: {} -> {export}", record.base, line.trim());
                push_line(&mut out, &export.to_string());
            }
            LineRewrite::Library(library) => push_line(&mut out, &library),
            LineRewrite::Unchanged => {
                trace!("{}: unchanged line {}", record.base, line_index + 1);
                push_line(&mut out, &line);
            }
        }
    }

    if lib.is_incomplete() {
        warn!(
            "{} looks like an embedded library but its name or '{{{{lib:parent}}}}' placeholder \
             was not found; imports of it keep the file-derived name",
            record.relative_path().display()
        );
    }

    record.contents = out;
    record.lib = lib;
    record.pending_links = pending_links;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;

    fn record(path: &str) -> FileRecord {
        FileRecord::from_relative(Path::new(""), Path::new(path), HyphenMode::All)
    }

    fn rewrite_line(path: &str, line: &str) -> Option<String> {
        let record = record(path);
        let options = RewriteOptions::default();
        let ctx = ModuleContext::new(&record, &options);
        parse_import(line, &ctx)
            .map(|import| import.to_string())
            .or_else(|| parse_export(line, &ctx).map(|export| export.to_string()))
    }

    #[test]
    fn test_import_destructures_matching_name() {
        assert_eq!(
            rewrite_line("main.js", "import a from './src/util/a.js'").as_deref(),
            Some("const { a } = $__TREE.src.util;")
        );
    }

    #[test]
    fn test_import_plain_binding() {
        assert_eq!(
            rewrite_line("main.js", "import A from './src/util/a.js';").as_deref(),
            Some("const A = $__TREE.src.util.a;")
        );
        assert_eq!(
            rewrite_line("src/util2/d.js", "  import Util from '../util/a';").as_deref(),
            Some("  const Util = $__TREE.src.util.a;")
        );
    }

    #[test]
    fn test_import_normalizes_hyphens_and_keeps_trailing_text() {
        assert_eq!(
            rewrite_line(
                "src/main.js",
                "    import Helper from './my-lib/my-helper'; // helper"
            )
            .as_deref(),
            Some("    const Helper = $__TREE.src.mylib.myhelper; // helper")
        );
    }

    #[test]
    fn test_import_with_double_quotes() {
        assert_eq!(
            rewrite_line("src/main.js", "import b from \"./b.js\";").as_deref(),
            Some("const { b } = $__TREE.src;")
        );
    }

    #[test]
    fn test_keyword_substrings_are_not_corrupted() {
        // `c` is a substring of `const`, `fromage` contains `from`
        assert_eq!(
            rewrite_line("src/x.js", "import c from './c';").as_deref(),
            Some("const { c } = $__TREE.src;")
        );
        assert_eq!(
            rewrite_line("src/x.js", "import fromage from './cheese/fromage';").as_deref(),
            Some("const { fromage } = $__TREE.src.cheese;")
        );
    }

    #[test]
    fn test_unsupported_imports_pass_through() {
        for line in [
            "import { a } from './a';",
            "import * as a from './a';",
            "import './side-effect';",
            "import a from",
            "const s = 'import a from b';",
            "// import and from in a comment",
        ] {
            assert_eq!(rewrite_line("src/x.js", line), None, "{line}");
        }
    }

    #[test]
    fn test_export_single_identifier() {
        assert_eq!(
            rewrite_line("src/util2/d.js", "export default Foo;").as_deref(),
            Some("$__TREE.extend($__TREE.src.util2.d, { Foo });")
        );
        assert_eq!(
            rewrite_line("src/util2/d.js", "    export default Foo").as_deref(),
            Some("    $__TREE.extend($__TREE.src.util2.d, { Foo });")
        );
    }

    #[test]
    fn test_export_object_literal() {
        assert_eq!(
            rewrite_line("src/util2/d.js", "export default { A, B };").as_deref(),
            Some("$__TREE.extend($__TREE.src.util2.d, { A, B });")
        );
        assert_eq!(
            rewrite_line("src/util2/d.js", "export default {A, B}").as_deref(),
            Some("$__TREE.extend($__TREE.src.util2.d, { A, B });")
        );
        assert_eq!(
            rewrite_line("src/util2/d.js", "export default {   A,  B   }; // api").as_deref(),
            Some("$__TREE.extend($__TREE.src.util2.d, { A,  B }); // api")
        );
        assert_eq!(
            rewrite_line("src/x.js", "    export default { api: { run }, B };").as_deref(),
            Some("    $__TREE.extend($__TREE.src.x, { api: { run }, B });")
        );
        assert_eq!(
            rewrite_line("src/x.js", "export default {a: {b: {}}} // nested").as_deref(),
            Some("$__TREE.extend($__TREE.src.x, { a: {b: {}} }); // nested")
        );
    }

    #[test]
    fn test_unbalanced_object_literal_passes_through() {
        for line in [
            "export default { api: { run };",
            "export default { A, B",
            "export default {{ A }",
        ] {
            assert_eq!(rewrite_line("src/x.js", line), None, "{line}");
        }
    }

    #[test]
    fn test_import_with_detached_semicolon() {
        assert_eq!(
            rewrite_line("src/x.js", "import a from './a' ;").as_deref(),
            Some("const { a } = $__TREE.src;")
        );
        assert_eq!(
            rewrite_line("src/x.js", "import A from './a' ; // note").as_deref(),
            Some("const A = $__TREE.src.a; // note")
        );
    }

    #[test]
    fn test_unsupported_exports_pass_through() {
        for line in [
            "export default function foo() {",
            "export default class Foo {",
            "export default 42;",
            "export default {",
            "export const a = 1;",
            "export  default Foo;",
        ] {
            assert_eq!(rewrite_line("src/x.js", line), None, "{line}");
        }
    }

    #[test]
    fn test_relink_to_library_name() {
        let record = record("src/app.js");
        let options = RewriteOptions::default();
        let ctx = ModuleContext::new(&record, &options);

        let import = parse_import("import M from './lib/messenger';", &ctx).expect("import");
        assert_eq!(
            import.relink("Messenger").to_string(),
            "const M = $__TREE.src.lib.Messenger;"
        );

        let import = parse_import("import Messenger from './lib/messenger';", &ctx).expect("import");
        assert_eq!(
            import.relink("Messenger").to_string(),
            "const { Messenger } = $__TREE.src.lib;"
        );
    }

    #[test]
    fn test_relink_destructured_import() {
        let record = record("src/app.js");
        let options = RewriteOptions::default();
        let ctx = ModuleContext::new(&record, &options);

        let import = parse_import("import messenger from './lib/messenger';", &ctx).expect("import");
        assert_eq!(import.to_string(), "const { messenger } = $__TREE.src.lib;");
        assert_eq!(import.link().to_string(), "$__TREE.src.lib.messenger");
        assert_eq!(
            import.relink("Messenger").to_string(),
            "const messenger = $__TREE.src.lib.Messenger;"
        );
    }

    #[test]
    fn test_rewrite_file_records_pending_links() {
        let mut record = record("src/app.js");
        record.contents = "\
  (function() {
    import a from './a';
    import Lib from './lib/thing';
    export default { a, Lib };
  }());
"
        .to_owned();

        rewrite_file(&mut record, &RewriteOptions::default()).expect("rewrite should succeed");

        assert_eq!(
            record.contents,
            "\
  (function() {
    const { a } = $__TREE.src;
    const Lib = $__TREE.src.lib.thing;
    $__TREE.extend($__TREE.src.app, { a, Lib });
  }());
"
        );
        let links: Vec<(usize, String)> = record
            .pending_links
            .iter()
            .map(|pending| (pending.line_index, pending.import.link().to_string()))
            .collect();
        assert_eq!(
            links,
            vec![
                (1, "$__TREE.src.a".to_owned()),
                (2, "$__TREE.src.lib.thing".to_owned()),
            ]
        );
        assert!(record.lib.is_unseen());
    }

    #[test]
    fn test_rewrite_file_links_embedded_library() {
        let mut record = record("src/lib/messenger.js");
        record.contents = "\
  (function(root, factory) {
    if (typeof define === 'function' && define.amd) {
      define([''], factory);
    } else {
      if (root.Messenger === null) root.Messenger = factory(root);
    }
  }({{lib:parent}}, function(root) {
    return {};
  }));
"
        .to_owned();

        rewrite_file(&mut record, &RewriteOptions::default()).expect("rewrite should succeed");

        assert!(record.contents.contains("  }($__TREE.src.lib, function(root) {\n"));
        let library = record.lib.library().expect("library should be linked");
        assert_eq!(library.name, "Messenger");
        assert_eq!(library.link.to_string(), "$__TREE.src.lib.messenger");
        assert_eq!(
            record.tree_path(HyphenMode::All).to_string(),
            "$__TREE.src.lib.Messenger"
        );
    }

    #[test]
    fn test_import_wins_over_library_placeholder() {
        let mut record = record("vendor/lib.js");
        record.contents = "\
if (typeof define === 'function' && define.amd) {
if (root.Lib === null) root.Lib = factory(root);
import x from './{{lib:parent}}';
"
        .to_owned();

        rewrite_file(&mut record, &RewriteOptions::default()).expect("rewrite should succeed");

        // the scanner still advances even though the import rewrite is emitted
        assert!(matches!(record.lib, crate::embedded_lib::LibraryState::Linked(_)));
        assert!(record.contents.ends_with("const x = $__TREE.vendor.{{lib:parent}};\n"));
    }

    #[test]
    fn test_module_context_paths() {
        let record = record("src/util-2/d.js");
        let options = RewriteOptions::default();
        let ctx = ModuleContext::new(&record, &options);
        assert_eq!(ctx.dir, PathBuf::from("src/util-2"));
        assert_eq!(ctx.module.to_string(), "$__TREE.src.util2.d");
        assert_eq!(ctx.directory.to_string(), "$__TREE.src.util2");
    }
}
