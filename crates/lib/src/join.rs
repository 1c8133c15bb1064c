//! Joined paths.
//!
//! Native dependencies often ship headers and libraries as separate output
//! directories while a build script expects one root (e.g. a single
//! `LIBTORCH` variable). A [`JoinedPath`] presents an ordered list of such
//! directories as one tree.
//!
//! # Collisions
//!
//! When several inputs contain the same relative path, the **last** input in
//! the list wins. Lookup, enumeration and materialization all follow this rule.
//! This includes file/directory collisions: a later file at `lib` hides an
//! earlier `lib/` directory with everything under it, and a later `lib/`
//! directory hides an earlier file `lib`.
//!
//! # Materialization
//!
//! Planning only computes where the joined tree lives
//! (`<store>/native/<hash>-<name>`). [`JoinedPath::materialize`] creates it as a
//! tree of real directories and symlinks to the winning files. The completion
//! marker records a digest of the merged entry set, so a tree whose inputs
//! gained or lost files since it was built is rebuilt instead of reused.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::platform::link::symlink;
use crate::util::hash::{ContentHash, HashError, Hashable, hash_bytes, relative_slash_path};

/// Marker written into a fully materialized joined tree.
pub const COMPLETE_MARKER: &str = ".lockplan-complete";

/// Errors that can occur while joining paths.
#[derive(Debug, Error)]
pub enum JoinError {
  /// No directories were given.
  #[error("joined path '{0}' has no input directories")]
  Empty(String),

  /// An input directory could not be walked.
  #[error("failed to walk {path}: {message}")]
  Walk { path: String, message: String },

  /// Creating the joined tree failed.
  #[error("failed to materialize {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: io::Error,
  },

  /// The joined path could not be hashed.
  #[error("failed to hash joined path: {0}")]
  Hash(#[from] HashError),
}

/// Several output directories of one logical dependency, presented as one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedPath {
  pub name: String,
  /// Input directories, lowest precedence first.
  pub paths: Vec<PathBuf>,
}

impl Hashable for JoinedPath {}

impl JoinedPath {
  pub fn new(name: &str, paths: Vec<PathBuf>) -> Result<Self, JoinError> {
    if paths.is_empty() {
      return Err(JoinError::Empty(name.to_string()));
    }
    Ok(Self {
      name: name.to_string(),
      paths,
    })
  }

  /// Content-addressed directory name, `<hash>-<name>`.
  pub fn store_name(&self) -> Result<String, JoinError> {
    Ok(format!("{}-{}", self.compute_hash()?, self.name))
  }

  /// Where the joined tree lives under `store_dir`.
  pub fn store_path(&self, store_dir: &Path) -> Result<PathBuf, JoinError> {
    Ok(store_dir.join("native").join(self.store_name()?))
  }

  /// Resolve a relative path against the inputs, last input first.
  pub fn lookup(&self, rel_path: &str) -> Option<PathBuf> {
    for root in self.paths.iter().rev() {
      let candidate = root.join(rel_path);
      if fs::symlink_metadata(&candidate).is_ok() {
        return Some(candidate);
      }
      if has_file_ancestor(root, rel_path) {
        return None;
      }
    }
    None
  }

  /// The merged view: relative path -> winning non-directory entry.
  pub fn entries(&self) -> Result<BTreeMap<String, PathBuf>, JoinError> {
    let mut merged: BTreeMap<String, PathBuf> = BTreeMap::new();

    for root in &self.paths {
      for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| JoinError::Walk {
          path: root.display().to_string(),
          message: e.to_string(),
        })?;
        let rel = relative_slash_path(root, entry.path());
        if rel.is_empty() {
          continue;
        }

        if entry.file_type().is_dir() {
          merged.remove(&rel);
          continue;
        }

        let prefix = format!("{rel}/");
        let hidden: Vec<String> = merged
          .range(prefix.clone()..)
          .take_while(|(path, _)| path.starts_with(&prefix))
          .map(|(path, _)| path.clone())
          .collect();
        for path in hidden {
          merged.remove(&path);
        }
        merged.insert(rel, entry.path().to_path_buf());
      }
    }

    Ok(merged)
  }

  /// Create the joined tree under `store_dir` and return its path.
  ///
  /// An existing complete tree is reused when it was built from the same
  /// entry set. The tree is assembled in a temporary sibling directory and
  /// renamed into place.
  pub fn materialize(&self, store_dir: &Path) -> Result<PathBuf, JoinError> {
    let dest = self.store_path(store_dir)?;
    let entries = self.entries()?;
    let digest = entries_digest(&entries);

    match fs::read_to_string(dest.join(COMPLETE_MARKER)) {
      Ok(recorded) if recorded == digest.0 => {
        debug!(path = %dest.display(), "joined path already materialized");
        return Ok(dest);
      }
      Ok(_) => debug!(path = %dest.display(), "joined path inputs changed, rebuilding"),
      Err(_) => {}
    }

    let io_err = |path: &Path| {
      let path = path.display().to_string();
      move |source: io::Error| JoinError::Io { path, source }
    };

    let parent = dest.parent().unwrap_or(store_dir);
    fs::create_dir_all(parent).map_err(io_err(parent))?;

    let staging = parent.join(format!(".tmp-{}", self.store_name()?));
    if staging.exists() {
      fs::remove_dir_all(&staging).map_err(io_err(&staging))?;
    }
    fs::create_dir_all(&staging).map_err(io_err(&staging))?;

    for (rel, target) in &entries {
      let link = staging.join(rel);
      if let Some(dir) = link.parent() {
        fs::create_dir_all(dir).map_err(io_err(dir))?;
      }
      symlink(target, &link).map_err(io_err(&link))?;
    }
    fs::write(staging.join(COMPLETE_MARKER), &digest.0).map_err(io_err(&staging))?;

    if dest.exists() {
      fs::remove_dir_all(&dest).map_err(io_err(&dest))?;
    }
    fs::rename(&staging, &dest).map_err(io_err(&dest))?;

    info!(name = %self.name, entries = entries.len(), path = %dest.display(), "materialized joined path");
    Ok(dest)
  }
}

/// Whether some proper ancestor of `rel_path` under `root` is a non-directory.
fn has_file_ancestor(root: &Path, rel_path: &str) -> bool {
  rel_path
    .match_indices('/')
    .map(|(i, _)| &rel_path[..i])
    .any(|prefix| fs::symlink_metadata(root.join(prefix)).is_ok_and(|meta| !meta.is_dir()))
}

fn entries_digest(entries: &BTreeMap<String, PathBuf>) -> ContentHash {
  let mut listing = String::new();
  for (rel, target) in entries {
    listing.push_str(rel);
    listing.push('\0');
    listing.push_str(&target.to_string_lossy());
    listing.push('\n');
  }
  hash_bytes(listing.as_bytes())
}
