//! Detection and linking of embedded third-party libraries.
//!
//! An embedded library is a UMD bundle shipped unmodified except for one
//! placeholder. It is recognized by three lines, in order:
//!
//! ```text
//! if (typeof define === 'function' && define.amd) {
//!   ...
//!   if (root.Messenger === null) root.Messenger = factory(root);
//!   ...
//! }({{lib:parent}}, function(root) {
//! ```
//!
//! The first line is the bootstrap signature, the second names the exported
//! global and the third receives the namespace of the library's directory, so
//! that `root.Messenger` ends up published as `$__TREE.<dir>.Messenger`.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::namespace::{LIB_PARENT_TAG, NamespacePath};

/// Leading tokens of the UMD environment detection line.
const SIGNATURE: [&str; 7] = [
    "if",
    "(typeof",
    "define",
    "===",
    "'function'",
    "&&",
    "define.amd)",
];

static ROOT_NAME_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(root\.(\w\S*)$").expect("root name pattern is valid"));

static ROOT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"root\.\w").expect("root assignment pattern is valid"));

/// A fully discovered embedded library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedLibrary {
    /// The trimmed bootstrap line that identified the library.
    pub signature: String,
    /// Global name the library exports (e.g. `Messenger`).
    pub name: String,
    /// Namespace path derived from the library's file location, which is what
    /// importers reference before the real name is known.
    pub link: NamespacePath,
}

/// Per-file scanner state. Transitions only move forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LibraryState {
    /// No signature seen; the file is an ordinary module so far.
    #[default]
    Unseen,
    SignatureFound {
        signature: String,
    },
    NameFound {
        signature: String,
        name: String,
    },
    /// The placeholder was substituted; nothing more is matched.
    Linked(EmbeddedLibrary),
}

impl LibraryState {
    pub fn is_unseen(&self) -> bool {
        matches!(self, Self::Unseen)
    }

    /// Signature found but the name or the placeholder never showed up.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::SignatureFound { .. } | Self::NameFound { .. })
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            Self::Unseen => None,
            Self::SignatureFound { signature } | Self::NameFound { signature, .. } => {
                Some(signature)
            }
            Self::Linked(library) => Some(&library.signature),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Unseen | Self::SignatureFound { .. } => None,
            Self::NameFound { name, .. } => Some(name),
            Self::Linked(library) => Some(&library.name),
        }
    }

    pub fn link(&self) -> Option<&NamespacePath> {
        self.library().map(|library| &library.link)
    }

    pub fn library(&self) -> Option<&EmbeddedLibrary> {
        match self {
            Self::Linked(library) => Some(library),
            _ => None,
        }
    }

    /// Advance the scanner by one line.
    ///
    /// `directory` is the namespace of the file's directory, substituted for
    /// the placeholder, and `module` is the file-derived namespace recorded as
    /// the library link. Returns the rewritten line when the placeholder was
    /// substituted.
    pub fn scan_line(
        &mut self,
        line: &str,
        directory: &NamespacePath,
        module: &NamespacePath,
    ) -> Option<String> {
        match self {
            Self::Unseen => {
                let signature = match_signature(line)?;
                debug!("Embedded library signature: {signature}");
                *self = Self::SignatureFound {
                    signature: signature.to_owned(),
                };
                None
            }
            Self::SignatureFound { signature } => {
                let name = match_library_name(line)?;
                debug!("Embedded library name: {name}");
                *self = Self::NameFound {
                    signature: std::mem::take(signature),
                    name: name.to_owned(),
                };
                None
            }
            Self::NameFound { signature, name } => {
                if !line.contains(LIB_PARENT_TAG) {
                    return None;
                }
                let rewritten = line.replacen(LIB_PARENT_TAG, &directory.to_string(), 1);
                debug!("Embedded library '{name}' linked as {module}");
                *self = Self::Linked(EmbeddedLibrary {
                    signature: std::mem::take(signature),
                    name: std::mem::take(name),
                    link: module.clone(),
                });
                Some(rewritten)
            }
            Self::Linked(_) => None,
        }
    }
}

/// Match the UMD bootstrap line, returning it trimmed.
pub fn match_signature(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let tokens: Vec<&str> = trimmed.split(' ').collect();
    if tokens.len() >= SIGNATURE.len() && tokens[..SIGNATURE.len()] == SIGNATURE {
        Some(trimmed)
    } else {
        None
    }
}

/// Match `if (root.NAME === null) root.NAME = factory(root);`, returning NAME.
pub fn match_library_name(line: &str) -> Option<&str> {
    let tokens: Vec<&str> = line.trim().split(' ').collect();
    let [first, open, eq, null, target, assign, factory, ..] = tokens.as_slice() else {
        return None;
    };
    if *first != "if"
        || *eq != "==="
        || *null != "null)"
        || *assign != "="
        || *factory != "factory(root);"
        || !ROOT_NAME.is_match(*target)
    {
        return None;
    }
    ROOT_NAME_OPEN
        .captures(*open)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}
