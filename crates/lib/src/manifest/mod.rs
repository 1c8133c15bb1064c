//! Locked manifest reading.
//!
//! The manifest is the resolved package set handed to the planner. Reading it
//! happens in two steps:
//!
//! 1. [`LockFile`] parses the on-disk JSON format
//! 2. [`PackageGraph::from_lock`] validates it into an immutable graph of
//!    [`PackageNode`]s with resolved dependency edges
//!
//! A graph that passes validation has no dangling edges, no conflicting
//! duplicate entries and no cycles.

mod graph;
pub mod lock;
mod types;

pub use graph::PackageGraph;
pub use lock::{LOCK_FILENAME, LOCK_VERSION, LockFile, LockedPackage};
pub use types::*;

use std::io;

use thiserror::Error;

/// A structural defect in the manifest, or a failure to read it.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// Failed to read the lock file.
  #[error("failed to read lock file {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  /// Failed to write the lock file.
  #[error("failed to write lock file {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: io::Error,
  },

  /// Failed to parse the lock file JSON.
  #[error("failed to parse lock file: {0}")]
  Parse(#[source] serde_json::Error),

  /// Failed to serialize the lock file.
  #[error("failed to serialize lock file: {0}")]
  Serialize(#[source] serde_json::Error),

  /// Lock file version is not supported.
  #[error("unsupported lock file version {0}, expected {LOCK_VERSION}")]
  UnsupportedVersion(u32),

  /// A package entry is missing its name or version.
  #[error("package entry #{index} is invalid: {reason}")]
  InvalidPackage { index: usize, reason: String },

  /// A dependency entry could not be parsed.
  #[error("package {package} has an unparsable dependency entry '{entry}'")]
  InvalidDependency { package: PackageId, entry: String },

  /// A dependency edge points at a package that is not in the manifest.
  #[error("package {package} depends on '{dependency}', which is not in the manifest")]
  DanglingDependency { package: PackageId, dependency: String },

  /// A bare-name dependency matches more than one locked version.
  #[error("package {package} depends on '{dependency}', which is ambiguous between {}", .candidates.join(", "))]
  AmbiguousDependency {
    package: PackageId,
    dependency: String,
    candidates: Vec<String>,
  },

  /// Two entries share a package id but name different sources.
  #[error("package {package} is locked twice with conflicting sources '{first}' and '{second}'")]
  ConflictingSource {
    package: PackageId,
    first: String,
    second: String,
  },

  /// Two entries share a package id and source but differ otherwise.
  #[error("package {0} is locked twice with differing entries")]
  DuplicatePackage(PackageId),

  /// The dependency graph is not acyclic.
  #[error("dependency cycle detected involving package {0}")]
  Cycle(PackageId),
}
