//! Build planning.
//!
//! Planning turns a validated [`PackageGraph`] into a [`BuildPlan`]:
//!
//! 1. **Gate**: every node's license is checked before anything else. The
//!    first denied package in id order fails the plan.
//! 2. **Generate**: one default unit per node, in parallel.
//! 3. **Override**: registered patches are applied and validated.
//! 4. **Natives**: native inputs are resolved to joined store paths and
//!    `$${native:NAME}` placeholders in the environment are substituted.
//! 5. **Assemble**: units are wired into a DAG mirroring the package graph.
//!
//! Planning reads the lock file and configuration only. It never builds,
//! fetches or writes anything, and on error returns no partial plan.

mod dag;

pub use dag::{BuildPlan, ResolvedNative};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::build::{BuildUnit, Generator};
use crate::config::PlanConfig;
use crate::filter::FilterError;
use crate::gate::{GatePolicy, RestrictedPackage};
use crate::join::JoinError;
use crate::manifest::{ManifestError, PackageGraph, PackageId, PackageNode};
use crate::overrides::{InvalidOverride, OverrideRegistry, Patch};
use crate::placeholder::{self, PlaceholderError, Resolver};
use crate::platform::paths::default_store_dir;

/// Errors that abort planning.
#[derive(Debug, Error)]
pub enum PlanError {
  /// The lock file is unreadable or structurally invalid.
  #[error("malformed manifest: {0}")]
  MalformedManifest(#[from] ManifestError),

  /// An override produced an invalid unit or referenced something unknown.
  #[error(transparent)]
  InvalidOverride(#[from] InvalidOverride),

  /// A package's license is not allow-listed.
  #[error(transparent)]
  RestrictedPackage(#[from] RestrictedPackage),

  /// A source pattern failed to compile.
  #[error("source filter failed: {0}")]
  FilterComposition(#[from] FilterError),

  /// A native dependency's store location could not be computed.
  #[error("native dependency failed: {0}")]
  Native(#[from] JoinError),
}

/// Plans a package graph with a fixed configuration and override registry.
#[derive(Debug, Clone)]
pub struct Planner {
  gate: GatePolicy,
  generator: Generator,
  registry: OverrideRegistry,
  config: PlanConfig,
  store_dir: PathBuf,
}

impl Planner {
  /// A planner using the configuration's gate, generator defaults and
  /// declarative overrides.
  ///
  /// The store directory is `config.store_dir`, else the data dir default.
  /// `LOCKPLAN_STORE` is not read here. Use [`PlanConfig::resolve_store_dir`]
  /// to fold it into the config beforehand.
  pub fn new(config: &PlanConfig) -> Result<Self, PlanError> {
    Ok(Self {
      gate: config.gate.clone(),
      generator: Generator::new(&config.generator)?,
      registry: config.registry(),
      config: config.clone(),
      store_dir: config.store_dir.clone().unwrap_or_else(default_store_dir),
    })
  }

  /// Register an additional patch, replacing any configured one for `name`.
  pub fn with_patch(mut self, name: &str, patch: impl Patch + 'static) -> Self {
    self.registry.register(name, patch);
    self
  }

  pub fn with_store_dir(mut self, store_dir: impl Into<PathBuf>) -> Self {
    self.store_dir = store_dir.into();
    self
  }

  pub fn registry(&self) -> &OverrideRegistry {
    &self.registry
  }

  pub fn store_dir(&self) -> &Path {
    &self.store_dir
  }

  pub fn plan(&self, graph: &PackageGraph) -> Result<BuildPlan, PlanError> {
    self.check_gate(graph)?;

    let nodes: Vec<&PackageNode> = graph.nodes().collect();
    let resolved: Vec<Result<BuildUnit, InvalidOverride>> = nodes
      .par_iter()
      .map(|node| self.registry.resolve(node, self.generator.generate(node)))
      .collect();

    // Collected in node order so the reported error does not depend on scheduling
    let mut units = BTreeMap::new();
    for result in resolved {
      let unit = result?;
      units.insert(unit.id.clone(), unit);
    }

    let natives = self.resolve_natives(&units)?;
    let store = self.store_dir.display().to_string();
    let native_paths: BTreeMap<String, String> = natives
      .iter()
      .map(|(name, native)| (name.clone(), native.store_path.display().to_string()))
      .collect();
    let resolver = NativePaths {
      paths: &native_paths,
      store: &store,
    };
    for unit in units.values_mut() {
      substitute_env(unit, &resolver)?;
    }

    let plan = BuildPlan::new(units, natives, self.store_dir.clone())?;
    info!(
      units = plan.len(),
      edges = plan.edge_count(),
      waves = plan.waves().len(),
      natives = plan.natives().len(),
      "planned build"
    );
    Ok(plan)
  }

  fn check_gate(&self, graph: &PackageGraph) -> Result<(), RestrictedPackage> {
    for node in graph.nodes() {
      if let Err(denied) = self.gate.check(node) {
        warn!(package = %denied.package, license = %denied.license, "package denied by license gate");
        return Err(denied);
      }
    }
    debug!(packages = graph.len(), "license gate passed");
    Ok(())
  }

  fn resolve_natives(
    &self,
    units: &BTreeMap<PackageId, BuildUnit>,
  ) -> Result<BTreeMap<String, ResolvedNative>, PlanError> {
    let mut natives = BTreeMap::new();

    for unit in units.values() {
      for name in &unit.native_inputs {
        if natives.contains_key(name) {
          continue;
        }
        let Some(joined) = self.config.joined_path(name) else {
          return Err(
            InvalidOverride::new(
              &unit.id,
              "native_inputs",
              format!("unknown native dependency '{name}'"),
            )
            .into(),
          );
        };
        let joined = joined?;
        let store_path = joined.store_path(&self.store_dir)?;
        debug!(native = %name, path = %store_path.display(), "resolved native dependency");
        natives.insert(name.clone(), ResolvedNative { joined, store_path });
      }
    }

    Ok(natives)
  }
}

/// Plan `graph` with the configuration's gate, generator and overrides.
pub fn plan(graph: &PackageGraph, config: &PlanConfig) -> Result<BuildPlan, PlanError> {
  Planner::new(config)?.plan(graph)
}

/// Load the lock file at `path` and plan it.
pub fn plan_file(path: &Path, config: &PlanConfig) -> Result<BuildPlan, PlanError> {
  let graph = PackageGraph::load(path)?;
  plan(&graph, config)
}

struct NativePaths<'a> {
  paths: &'a BTreeMap<String, String>,
  store: &'a str,
}

impl Resolver for NativePaths<'_> {
  fn resolve_native(&self, name: &str) -> Result<&str, PlaceholderError> {
    self
      .paths
      .get(name)
      .map(String::as_str)
      .ok_or_else(|| PlaceholderError::UnresolvedNative(name.to_string()))
  }

  fn resolve_store(&self) -> Result<&str, PlaceholderError> {
    Ok(self.store)
  }
}

/// Substitute placeholders in a unit's environment. A unit may only reference
/// natives it lists as inputs.
fn substitute_env(unit: &mut BuildUnit, resolver: &NativePaths<'_>) -> Result<(), InvalidOverride> {
  let invalid_env = |key: &str, err: PlaceholderError| InvalidOverride::new(&unit.id, "env", format!("{key}: {err}"));

  let mut substituted = BTreeMap::new();
  for (key, value) in &unit.env {
    let references = placeholder::native_references(value).map_err(|e| invalid_env(key, e))?;
    if let Some(missing) = references.iter().find(|name| !unit.native_inputs.contains(*name)) {
      return Err(InvalidOverride::new(
        &unit.id,
        "env",
        format!("{key} references native '{missing}', which is not a native input"),
      ));
    }
    let resolved = placeholder::substitute(value, resolver).map_err(|e| invalid_env(key, e))?;
    substituted.insert(key.clone(), resolved);
  }

  unit.env = substituted;
  Ok(())
}
