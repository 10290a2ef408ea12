//! Rewrites `import`/`export default` modules into IIFEs that publish onto a
//! shared `$__TREE` namespace object, and concatenates them into one file.

pub mod assembler;
pub mod bundler;
pub mod config;
pub mod discovery;
pub mod embedded_lib;
pub mod file_record;
pub mod iife_wrapper;
pub mod link_fixer;
pub mod namespace;
pub mod namespace_tree;
pub mod statement_rewriter;
pub mod types;
pub mod util;
