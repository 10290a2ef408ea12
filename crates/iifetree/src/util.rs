//! Line-source helpers shared by the rewriting passes.
//!
//! Every pass consumes a file as an ordered sequence of physical lines and
//! produces a new buffer where each emitted line is terminated by `\n`.

use std::io::BufRead;

use anyhow::{Context, Result};

/// Iterate over the lines of `reader`, attaching the 1-based line number to
/// any read failure (e.g. input that is not valid UTF-8).
pub fn lines<R: BufRead>(reader: R) -> impl Iterator<Item = Result<String>> {
    reader
        .lines()
        .enumerate()
        .map(|(index, line)| line.with_context(|| format!("Failed to read line {}", index + 1)))
}

/// Append `line` and a line terminator to `out`.
pub fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Leading whitespace of `line`.
pub fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Whether `line` is empty or only whitespace.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}
