//! Wraps the marked body of a module into an immediately-invoked function.
//!
//! Input files carry exactly one marker pair:
//!
//! ```text
//! // IIFE_START
//! const a = 1;
//! // IIFE_END
//! ```
//!
//! which is rewritten to
//!
//! ```text
//!   (function() {
//!     // IIFE START
//!     const a = 1;
//!     // IIFE END
//!   }());
//! ```
//!
//! Lines outside the markers are indented by two spaces, lines inside by four.
//! Files without a complete marker pair are not validated and produce
//! unspecified (but never failing) output.

use std::io::BufRead;

use anyhow::Result;

use crate::util::{self, push_line};

/// Marker opening the function body. Matched anywhere in a line.
pub const IIFE_START: &str = "IIFE_START";
/// Marker closing the function body. Matched anywhere in a line.
pub const IIFE_END: &str = "IIFE_END";

const HEADER: [&str; 2] = ["  (function() {", "    // IIFE START"];
const FOOTER: [&str; 2] = ["    // IIFE END", "  }());"];

const OUTER_INDENT: &str = "  ";
const INNER_INDENT: &str = "    ";

/// Wrap the marked region of `source` in an IIFE.
///
/// A trailing empty line is appended so that concatenated modules stay
/// visually separated.
pub fn wrap<R: BufRead>(source: R) -> Result<String> {
    let mut out = String::new();
    let mut inside = false;

    for line in util::lines(source) {
        let line = line?;
        if line.contains(IIFE_START) {
            for header in HEADER {
                push_line(&mut out, header);
            }
            inside = true;
        } else if line.contains(IIFE_END) {
            for footer in FOOTER {
                push_line(&mut out, footer);
            }
            inside = false;
        } else if util::is_blank(&line) {
            out.push('\n');
        } else {
            out.push_str(if inside { INNER_INDENT } else { OUTER_INDENT });
            push_line(&mut out, &line);
        }
    }

    out.push('\n');
    Ok(out)
}
