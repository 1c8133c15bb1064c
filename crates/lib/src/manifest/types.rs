use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::filter::{SourceRoot, SourceTree};

/// Identity of a locked package: `(name, version)`.
///
/// Displays and serializes as `name@version`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId {
  pub name: String,
  pub version: String,
}

impl PackageId {
  pub fn new(name: &str, version: &str) -> Self {
    Self {
      name: name.to_string(),
      version: version.to_string(),
    }
  }
}

impl fmt::Display for PackageId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.name, self.version)
  }
}

impl TryFrom<String> for PackageId {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    match value.rsplit_once('@') {
      Some((name, version)) if !name.is_empty() && !version.is_empty() => Ok(Self::new(name, version)),
      _ => Err(format!("invalid package id '{}', expected name@version", value)),
    }
  }
}

impl From<PackageId> for String {
  fn from(id: PackageId) -> Self {
    id.to_string()
  }
}

/// Where a package's sources live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLocator {
  /// A local directory, absolute once the graph is built.
  Path(PathBuf),
  /// An opaque remote identifier such as `registry+https://...` or `git+https://...#rev`.
  Remote(String),
}

impl SourceLocator {
  /// Parse a lock file `source` string, anchoring relative paths at `base_dir`.
  pub fn parse(source: &str, base_dir: &Path) -> Self {
    match source.strip_prefix("path:") {
      Some(path) => {
        let path = Path::new(path);
        if path.is_absolute() {
          SourceLocator::Path(path.to_path_buf())
        } else {
          SourceLocator::Path(base_dir.join(path))
        }
      }
      None => SourceLocator::Remote(source.to_string()),
    }
  }

  /// The unfiltered source tree for this locator.
  pub fn tree(&self) -> SourceTree {
    match self {
      SourceLocator::Path(path) => SourceTree::new(SourceRoot::Path(path.clone())),
      SourceLocator::Remote(id) => SourceTree::new(SourceRoot::Remote(id.clone())),
    }
  }

  pub fn is_remote(&self) -> bool {
    matches!(self, SourceLocator::Remote(_))
  }
}

/// A parsed dependency reference from a lock file entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef<'a> {
  pub name: &'a str,
  pub version: Option<&'a str>,
}

impl<'a> DependencyRef<'a> {
  /// Parse `name`, `name version` or `name version (source)`.
  ///
  /// Returns `None` for an empty entry or unexpected trailing tokens.
  pub fn parse(entry: &'a str) -> Option<Self> {
    let mut parts = entry.split_whitespace();
    let name = parts.next()?;
    let version = parts.next();
    match parts.next() {
      None => {}
      Some(rest) if rest.starts_with('(') && entry.trim_end().ends_with(')') => {}
      Some(_) => return None,
    }
    Some(Self { name, version })
  }
}

/// A package in the validated graph. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageNode {
  pub id: PackageId,
  pub source: SourceLocator,
  /// Resolved dependency edges.
  pub dependencies: BTreeSet<PackageId>,
  /// License tag checked by the gate policy.
  pub license: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub checksum: Option<String>,
}

impl PackageNode {
  pub fn name(&self) -> &str {
    &self.id.name
  }

  pub fn version(&self) -> &str {
    &self.id.version
  }
}
