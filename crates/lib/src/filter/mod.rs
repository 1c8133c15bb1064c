//! Source filtering.
//!
//! A [`SourceTree`] names an original root (a local directory or a remote
//! identifier) plus an optional [`PatternSet`]. Filtering never copies files:
//! it only records which paths, relative to the original root, a build unit is
//! allowed to see. Narrow source slices keep unit hashes stable when unrelated
//! files change.
//!
//! # Matching Rules
//!
//! - Patterns are regular expressions, anchored at both ends, matched against
//!   the `/`-separated path relative to the original root
//! - Directories are always included so matched descendants stay reachable
//! - Filtering an already-filtered tree unions the pattern lists and keeps the
//!   original root, so `filter(P).filter(Q) == filter(P ∪ Q)`
//!
//! # Example
//!
//! ```
//! use lockplan_lib::filter::SourceTree;
//!
//! let tree = SourceTree::local("/src/demo").filter(&["Cargo\\.toml"]).unwrap();
//! let tree = tree.filter(&[".*\\.rs"]).unwrap();
//!
//! assert!(tree.includes("src/lib.rs", false));
//! assert!(tree.includes("Cargo.toml", false));
//! assert!(!tree.includes("README.md", false));
//! assert!(tree.includes("docs", true));
//! ```

mod pattern;
mod tree;

pub use pattern::PatternSet;
pub use tree::{EntryKind, SourceRoot, SourceTree, TreeEntry};

use thiserror::Error;

use crate::util::hash::DirHashError;

/// Errors that can occur while building or reading a filtered tree.
#[derive(Debug, Error)]
pub enum FilterError {
  /// A pattern failed to compile.
  #[error("invalid source pattern '{pattern}': {source}")]
  InvalidPattern {
    pattern: String,
    #[source]
    source: regex::Error,
  },

  /// The tree's root is a remote identifier and cannot be enumerated locally.
  #[error("cannot read remote source '{0}' without fetching it first")]
  RemoteRoot(String),

  /// Walking the original root failed.
  #[error("failed to walk source tree {root}: {message}")]
  Walk { root: String, message: String },

  /// Hashing the filtered slice failed.
  #[error(transparent)]
  Hash(#[from] DirHashError),
}
