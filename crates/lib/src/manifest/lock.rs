//! Lock file parsing.
//!
//! The lock file (`lockplan.lock`) enumerates the already-resolved package set.
//! Relative `path:` sources are anchored at the lock file's directory.
//!
//! # Lock File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "packages": [
//!     {
//!       "name": "annotator",
//!       "version": "0.4.0",
//!       "source": "path:.",
//!       "dependencies": ["serde", "tokenizer 0.2.1"],
//!       "license": "Apache-2.0"
//!     },
//!     {
//!       "name": "serde",
//!       "version": "1.0.228",
//!       "source": "registry+https://github.com/rust-lang/crates.io-index",
//!       "license": "MIT OR Apache-2.0",
//!       "checksum": "9a8e94ea..."
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ManifestError;

/// Current lock file format version.
pub const LOCK_VERSION: u32 = 1;

/// Lock file name.
pub const LOCK_FILENAME: &str = "lockplan.lock";

/// A lock file listing every resolved package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
  /// Lock file format version.
  pub version: u32,
  /// Locked packages, in file order.
  #[serde(default)]
  pub packages: Vec<LockedPackage>,
}

/// One `packages` entry, exactly as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
  pub name: String,
  pub version: String,

  /// `path:<dir>` or an opaque remote identifier.
  pub source: String,

  /// Dependency references: `name` or `name version`.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub dependencies: Vec<String>,

  /// License tag checked by the gate policy.
  pub license: String,

  /// Checksum of the remote archive, when the source is remote.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub checksum: Option<String>,
}

impl Default for LockFile {
  fn default() -> Self {
    Self::new()
  }
}

impl LockFile {
  /// Create a new empty lock file.
  pub fn new() -> Self {
    Self {
      version: LOCK_VERSION,
      packages: Vec::new(),
    }
  }

  /// Parse a lock file from JSON text.
  pub fn parse(content: &str) -> Result<Self, ManifestError> {
    let lock: LockFile = serde_json::from_str(content).map_err(ManifestError::Parse)?;

    if lock.version != LOCK_VERSION {
      return Err(ManifestError::UnsupportedVersion(lock.version));
    }

    Ok(lock)
  }

  /// Load a lock file from the given path.
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let content = fs::read_to_string(path).map_err(|e| ManifestError::Read {
      path: path.display().to_string(),
      source: e,
    })?;
    Self::parse(&content)
  }

  /// Save the lock file as pretty-printed JSON.
  pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
    let content = serde_json::to_string_pretty(self).map_err(ManifestError::Serialize)?;
    fs::write(path, content).map_err(|e| ManifestError::Write {
      path: path.display().to_string(),
      source: e,
    })?;
    Ok(())
  }

  /// Append a package entry.
  pub fn push(&mut self, package: LockedPackage) {
    self.packages.push(package);
  }
}

impl LockedPackage {
  pub fn new(name: &str, version: &str, source: &str, license: &str) -> Self {
    Self {
      name: name.to_string(),
      version: version.to_string(),
      source: source.to_string(),
      dependencies: Vec::new(),
      license: license.to_string(),
      checksum: None,
    }
  }

  pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
    self.dependencies = deps.iter().map(|d| d.to_string()).collect();
    self
  }

  pub fn with_checksum(mut self, checksum: &str) -> Self {
    self.checksum = Some(checksum.to_string());
    self
  }
}
