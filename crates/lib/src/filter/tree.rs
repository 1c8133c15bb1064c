use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::{FilterError, PatternSet};
use crate::util::hash::{ContentHash, hash_directory, relative_slash_path};

/// The original root a source tree is anchored at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRoot {
  /// A local directory.
  Path(PathBuf),
  /// An opaque remote identifier, e.g. `registry+https://...`.
  Remote(String),
}

impl SourceRoot {
  pub fn local_path(&self) -> Option<&Path> {
    match self {
      SourceRoot::Path(path) => Some(path),
      SourceRoot::Remote(_) => None,
    }
  }
}

impl fmt::Display for SourceRoot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SourceRoot::Path(path) => write!(f, "{}", path.display()),
      SourceRoot::Remote(id) => write!(f, "{}", id),
    }
  }
}

/// A source tree handle: the original root plus the patterns applied to it.
///
/// `patterns` is `None` for an unfiltered tree. A filtered tree never points at
/// an intermediate filtered tree, only at the original root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTree {
  pub root: SourceRoot,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub patterns: Option<PatternSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
  File,
  Dir,
  Symlink,
}

/// One visible entry of a tree, relative to the original root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
  pub path: String,
  pub kind: EntryKind,
}

impl SourceTree {
  /// An unfiltered tree rooted at `root`.
  pub fn new(root: SourceRoot) -> Self {
    Self { root, patterns: None }
  }

  pub fn local(path: impl Into<PathBuf>) -> Self {
    Self::new(SourceRoot::Path(path.into()))
  }

  pub fn remote(id: impl Into<String>) -> Self {
    Self::new(SourceRoot::Remote(id.into()))
  }

  pub fn is_filtered(&self) -> bool {
    self.patterns.is_some()
  }

  /// Filter this tree.
  ///
  /// On an unfiltered tree this applies `patterns` to the root. On a filtered
  /// tree the new patterns are unioned with the carried ones and matched
  /// against the same original root.
  pub fn filter<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Self, FilterError> {
    let patterns = match &self.patterns {
      Some(existing) => existing.union(patterns)?,
      None => PatternSet::new(patterns)?,
    };
    Ok(Self {
      root: self.root.clone(),
      patterns: Some(patterns),
    })
  }

  /// Drop any carried patterns and filter the original root with `patterns` only.
  pub fn refilter<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Self, FilterError> {
    Self::new(self.root.clone()).filter(patterns)
  }

  /// Like [`refilter`](Self::refilter) with an already compiled set.
  pub fn with_patterns(&self, patterns: PatternSet) -> Self {
    Self {
      root: self.root.clone(),
      patterns: Some(patterns),
    }
  }

  /// Whether a path relative to the original root is visible in this tree.
  pub fn includes(&self, rel_path: &str, is_dir: bool) -> bool {
    match &self.patterns {
      None => true,
      Some(_) if is_dir => true,
      Some(set) => set.is_match(rel_path),
    }
  }

  /// Enumerate visible entries of a local tree, sorted by path.
  pub fn entries(&self) -> Result<Vec<TreeEntry>, FilterError> {
    let root = self.local_root()?;
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
      let entry = entry.map_err(|e| FilterError::Walk {
        root: root.display().to_string(),
        message: e.to_string(),
      })?;
      let rel = relative_slash_path(root, entry.path());
      if rel.is_empty() {
        continue;
      }

      let file_type = entry.file_type();
      let kind = if file_type.is_dir() {
        EntryKind::Dir
      } else if file_type.is_symlink() {
        EntryKind::Symlink
      } else if file_type.is_file() {
        EntryKind::File
      } else {
        continue;
      };

      if self.includes(&rel, kind == EntryKind::Dir) {
        entries.push(TreeEntry { path: rel, kind });
      }
    }

    Ok(entries)
  }

  /// Visible non-directory paths of a local tree.
  pub fn files(&self) -> Result<Vec<String>, FilterError> {
    Ok(
      self
        .entries()?
        .into_iter()
        .filter(|e| e.kind != EntryKind::Dir)
        .map(|e| e.path)
        .collect(),
    )
  }

  /// Content hash of the visible slice of a local tree.
  pub fn content_hash(&self) -> Result<ContentHash, FilterError> {
    let root = self.local_root()?;
    Ok(hash_directory(root, |rel, is_dir| self.includes(rel, is_dir))?)
  }

  fn local_root(&self) -> Result<&Path, FilterError> {
    self
      .root
      .local_path()
      .ok_or_else(|| FilterError::RemoteRoot(self.root.to_string()))
  }
}
