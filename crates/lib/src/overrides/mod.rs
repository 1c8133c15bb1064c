//! Per-package override patches.
//!
//! The generator knows nothing about individual packages. Packages that need
//! more (a native library, an environment variable, a wider source slice)
//! get a [`Patch`] registered under their name. A package with no entry keeps
//! its default unit unchanged.
//!
//! One patch per package name applies to every locked version of that name.
//!
//! # Validation
//!
//! A patch may change any field except the unit's identity and its dependency
//! set. The dependency set must keep matching the manifest edges, so a patched
//! unit graph stays isomorphic to the package graph.
//!
//! # Example
//!
//! ```
//! use lockplan_lib::build::BuildUnit;
//! use lockplan_lib::overrides::OverrideRegistry;
//!
//! let mut registry = OverrideRegistry::new();
//! registry.register("openssl-sys", |unit: BuildUnit| unit.with_env("OPENSSL_STATIC", "1"));
//!
//! assert!(registry.contains("openssl-sys"));
//! assert!(!registry.contains("serde"));
//! ```

mod spec;

pub use spec::OverrideSpec;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::build::BuildUnit;
use crate::manifest::{PackageId, PackageNode};

/// A pure transformation of one default build unit.
pub trait Patch: Send + Sync {
  fn apply(&self, unit: BuildUnit) -> BuildUnit;
}

impl<F> Patch for F
where
  F: Fn(BuildUnit) -> BuildUnit + Send + Sync,
{
  fn apply(&self, unit: BuildUnit) -> BuildUnit {
    self(unit)
  }
}

/// A patch produced a unit that violates the override rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid override for {package}: {field} {reason}")]
pub struct InvalidOverride {
  pub package: PackageId,
  /// The unit field that was changed or could not be resolved.
  pub field: String,
  pub reason: String,
}

impl InvalidOverride {
  pub fn new(package: &PackageId, field: &str, reason: impl Into<String>) -> Self {
    Self {
      package: package.clone(),
      field: field.to_string(),
      reason: reason.into(),
    }
  }
}

/// Package name -> patch.
#[derive(Clone, Default)]
pub struct OverrideRegistry {
  patches: BTreeMap<String, Arc<dyn Patch>>,
}

impl fmt::Debug for OverrideRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OverrideRegistry")
      .field("packages", &self.patches.keys().collect::<Vec<_>>())
      .finish()
  }
}

impl OverrideRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry holding one declarative spec per package name.
  pub fn from_specs(specs: &BTreeMap<String, OverrideSpec>) -> Self {
    let mut registry = Self::new();
    for (name, spec) in specs {
      registry.register(name, spec.clone());
    }
    registry
  }

  /// Register `patch` for `name`, returning the patch it replaces.
  pub fn register(&mut self, name: &str, patch: impl Patch + 'static) -> Option<Arc<dyn Patch>> {
    self.patches.insert(name.to_string(), Arc::new(patch))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.patches.contains_key(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.patches.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.patches.len()
  }

  pub fn is_empty(&self) -> bool {
    self.patches.is_empty()
  }

  /// Apply the patch registered for `node`, if any, and validate the result.
  pub fn resolve(&self, node: &PackageNode, unit: BuildUnit) -> Result<BuildUnit, InvalidOverride> {
    let Some(patch) = self.patches.get(node.name()) else {
      return Ok(unit);
    };

    let patched = patch.apply(unit);
    validate(node, &patched)?;
    debug!(package = %node.id, "applied override");
    Ok(patched)
  }
}

fn validate(node: &PackageNode, unit: &BuildUnit) -> Result<(), InvalidOverride> {
  if unit.id.name != node.id.name {
    return Err(InvalidOverride::new(
      &node.id,
      "name",
      format!("must stay '{}', got '{}'", node.id.name, unit.id.name),
    ));
  }
  if unit.id.version != node.id.version {
    return Err(InvalidOverride::new(
      &node.id,
      "version",
      format!("must stay '{}', got '{}'", node.id.version, unit.id.version),
    ));
  }
  if unit.dependencies != node.dependencies {
    let added: Vec<String> = unit
      .dependencies
      .difference(&node.dependencies)
      .map(ToString::to_string)
      .collect();
    let removed: Vec<String> = node
      .dependencies
      .difference(&unit.dependencies)
      .map(ToString::to_string)
      .collect();
    return Err(InvalidOverride::new(
      &node.id,
      "dependencies",
      format!(
        "must match the manifest edges (added [{}], removed [{}])",
        added.join(", "),
        removed.join(", ")
      ),
    ));
  }
  Ok(())
}
