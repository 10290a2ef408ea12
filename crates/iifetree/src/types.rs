//! Insertion-ordered collection aliases.
//!
//! Output must not depend on hashing: the namespace tree is serialized in
//! insertion order and discovery keeps the first occurrence of a path.

use std::hash::BuildHasherDefault;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;

/// Insertion-ordered map using `FxHasher`
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Insertion-ordered set using `FxHasher`
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;
