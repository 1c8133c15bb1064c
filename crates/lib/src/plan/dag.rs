//! The assembled build plan.
//!
//! A [`BuildPlan`] is a directed acyclic graph of build units. Edges run from
//! a dependency to its dependents, so a unit's incoming edges are exactly its
//! dependency set. The plan provides:
//! - Topological ordering of units
//! - Parallel waves (groups of units whose dependencies are all in earlier waves)
//! - Dependency and dependent queries
//!
//! Plans are read-only once assembled.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use tracing::info;

use crate::build::BuildUnit;
use crate::join::{JoinError, JoinedPath};
use crate::manifest::{ManifestError, PackageId};
use crate::util::hash::Hashable;

/// A native dependency resolved to its joined store location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedNative {
  pub joined: JoinedPath,
  pub store_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
  store_dir: PathBuf,
  /// Units with dependencies before dependents, ties broken by package id.
  order: Vec<PackageId>,
  waves: Vec<Vec<PackageId>>,
  units: BTreeMap<PackageId, BuildUnit>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  natives: BTreeMap<String, ResolvedNative>,

  #[serde(skip)]
  graph: DiGraph<PackageId, ()>,
  #[serde(skip)]
  indices: HashMap<PackageId, NodeIndex>,
}

impl Hashable for BuildPlan {}

impl BuildPlan {
  /// Assemble a plan from finished units.
  ///
  /// # Errors
  ///
  /// Returns `DanglingDependency` if a unit depends on a unit not in the plan
  /// and `Cycle` if the dependency edges are not acyclic.
  pub fn new(
    units: BTreeMap<PackageId, BuildUnit>,
    natives: BTreeMap<String, ResolvedNative>,
    store_dir: PathBuf,
  ) -> Result<Self, ManifestError> {
    let mut graph = DiGraph::new();
    let mut indices = HashMap::new();

    for id in units.keys() {
      let idx = graph.add_node(id.clone());
      indices.insert(id.clone(), idx);
    }

    for (id, unit) in &units {
      let dependent_idx = indices[id];
      for dep in &unit.dependencies {
        let Some(&dep_idx) = indices.get(dep) else {
          return Err(ManifestError::DanglingDependency {
            package: id.clone(),
            dependency: dep.to_string(),
          });
        };
        graph.add_edge(dep_idx, dependent_idx, ());
      }
    }

    toposort(&graph, None).map_err(|cycle| ManifestError::Cycle(graph[cycle.node_id()].clone()))?;

    let waves = compute_waves(&graph);
    let order = waves.iter().flatten().cloned().collect();

    Ok(Self {
      store_dir,
      order,
      waves,
      units,
      natives,
      graph,
      indices,
    })
  }

  pub fn len(&self) -> usize {
    self.units.len()
  }

  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }

  pub fn store_dir(&self) -> &Path {
    &self.store_dir
  }

  pub fn unit(&self, id: &PackageId) -> Option<&BuildUnit> {
    self.units.get(id)
  }

  /// Units sorted by package id.
  pub fn units(&self) -> impl Iterator<Item = &BuildUnit> {
    self.units.values()
  }

  /// Resolved native dependencies by name.
  pub fn natives(&self) -> &BTreeMap<String, ResolvedNative> {
    &self.natives
  }

  /// Package ids where every unit comes after its dependencies.
  pub fn topological_order(&self) -> &[PackageId] {
    &self.order
  }

  /// Groups of units that can be built in parallel, each wave depending only
  /// on earlier ones.
  pub fn waves(&self) -> &[Vec<PackageId>] {
    &self.waves
  }

  /// Direct dependencies of a unit, sorted.
  pub fn dependencies(&self, id: &PackageId) -> Vec<&PackageId> {
    self.neighbors(id, Direction::Incoming)
  }

  /// Units that depend directly on `id`, sorted.
  pub fn dependents(&self, id: &PackageId) -> Vec<&PackageId> {
    self.neighbors(id, Direction::Outgoing)
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  /// Materialize every resolved native dependency into the store.
  pub fn materialize_natives(&self) -> Result<Vec<PathBuf>, JoinError> {
    let mut paths = Vec::with_capacity(self.natives.len());
    for native in self.natives.values() {
      paths.push(native.joined.materialize(&self.store_dir)?);
    }
    info!(natives = paths.len(), "materialized native dependencies");
    Ok(paths)
  }

  fn neighbors(&self, id: &PackageId, direction: Direction) -> Vec<&PackageId> {
    let Some(&idx) = self.indices.get(id) else {
      return Vec::new();
    };

    let mut ids: Vec<&PackageId> = self
      .graph
      .neighbors_directed(idx, direction)
      .map(|n| &self.graph[n])
      .collect();
    ids.sort();
    ids
  }
}

/// Kahn's algorithm by levels. The graph must be acyclic.
fn compute_waves(graph: &DiGraph<PackageId, ()>) -> Vec<Vec<PackageId>> {
  let mut in_degree: HashMap<NodeIndex, usize> = graph
    .node_indices()
    .map(|idx| (idx, graph.neighbors_directed(idx, Direction::Incoming).count()))
    .collect();

  let mut remaining: BTreeSet<NodeIndex> = graph.node_indices().collect();
  let mut waves = Vec::new();

  while !remaining.is_empty() {
    let ready: Vec<NodeIndex> = remaining.iter().filter(|&&idx| in_degree[&idx] == 0).copied().collect();
    if ready.is_empty() {
      break;
    }

    for idx in &ready {
      remaining.remove(idx);
      for neighbor in graph.neighbors_directed(*idx, Direction::Outgoing) {
        if let Some(deg) = in_degree.get_mut(&neighbor) {
          *deg = deg.saturating_sub(1);
        }
      }
    }

    let mut wave: Vec<PackageId> = ready.into_iter().map(|idx| graph[idx].clone()).collect();
    wave.sort();
    waves.push(wave);
  }

  waves
}
