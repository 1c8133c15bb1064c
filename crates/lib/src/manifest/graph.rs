use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use tracing::{debug, warn};

use super::lock::{LockFile, LockedPackage};
use super::types::{DependencyRef, PackageId, PackageNode, SourceLocator};
use super::ManifestError;

/// The validated package graph.
///
/// Every edge points at a package in the graph and the graph is acyclic.
/// Nodes cannot be modified after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageGraph {
  nodes: BTreeMap<PackageId, PackageNode>,
  /// Package ids with dependencies before dependents.
  order: Vec<PackageId>,
}

impl PackageGraph {
  /// Read and validate the lock file at `path`.
  ///
  /// Relative `path:` sources are anchored at the lock file's directory.
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let lock = LockFile::load(path)?;
    let dir = path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .unwrap_or_else(|| Path::new("."));
    let base_dir = dunce::canonicalize(dir).map_err(|e| ManifestError::Read {
      path: dir.display().to_string(),
      source: e,
    })?;
    Self::from_lock(&lock, &base_dir)
  }

  /// Validate a parsed lock file into a graph.
  ///
  /// # Errors
  ///
  /// Fails before producing any node if an entry is invalid, an edge dangles
  /// or is ambiguous, a package id is locked twice with different contents,
  /// or the edges form a cycle.
  pub fn from_lock(lock: &LockFile, base_dir: &Path) -> Result<Self, ManifestError> {
    let entries = dedupe_entries(lock)?;

    let mut by_name: BTreeMap<&str, Vec<&PackageId>> = BTreeMap::new();
    for id in entries.keys() {
      by_name.entry(id.name.as_str()).or_default().push(id);
    }

    let mut nodes = BTreeMap::new();
    for (id, entry) in &entries {
      let mut dependencies = BTreeSet::new();
      for raw in &entry.dependencies {
        dependencies.insert(resolve_dependency(id, raw, &entries, &by_name)?);
      }

      nodes.insert(
        id.clone(),
        PackageNode {
          id: id.clone(),
          source: SourceLocator::parse(&entry.source, base_dir),
          dependencies,
          license: entry.license.clone(),
          checksum: entry.checksum.clone(),
        },
      );
    }

    let order = dependency_order(&nodes)?;
    debug!(packages = nodes.len(), "validated package graph");

    Ok(Self { nodes, order })
  }

  /// Get a node by id.
  pub fn get(&self, id: &PackageId) -> Option<&PackageNode> {
    self.nodes.get(id)
  }

  /// All locked versions of a package name.
  pub fn find(&self, name: &str) -> Vec<&PackageNode> {
    self.nodes.values().filter(|n| n.name() == name).collect()
  }

  /// Nodes sorted by package id.
  pub fn nodes(&self) -> impl Iterator<Item = &PackageNode> {
    self.nodes.values()
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Direct dependencies of a node.
  pub fn dependencies(&self, id: &PackageId) -> Vec<&PackageId> {
    self
      .nodes
      .get(id)
      .map(|n| n.dependencies.iter().collect())
      .unwrap_or_default()
  }

  /// Nodes that depend directly on `id`.
  pub fn dependents(&self, id: &PackageId) -> Vec<&PackageId> {
    self
      .nodes
      .values()
      .filter(|n| n.dependencies.contains(id))
      .map(|n| &n.id)
      .collect()
  }

  /// Package ids in an order where dependencies come before dependents.
  pub fn topological_order(&self) -> &[PackageId] {
    &self.order
  }
}

/// Collapse exact duplicates and reject conflicting ones.
fn dedupe_entries(lock: &LockFile) -> Result<BTreeMap<PackageId, &LockedPackage>, ManifestError> {
  let mut entries: BTreeMap<PackageId, &LockedPackage> = BTreeMap::new();

  for (index, entry) in lock.packages.iter().enumerate() {
    if entry.name.trim().is_empty() {
      return Err(ManifestError::InvalidPackage {
        index,
        reason: "name is empty".to_string(),
      });
    }
    if entry.version.trim().is_empty() {
      return Err(ManifestError::InvalidPackage {
        index,
        reason: format!("version of '{}' is empty", entry.name),
      });
    }

    let id = PackageId::new(&entry.name, &entry.version);
    let Some(existing) = entries.get(&id) else {
      entries.insert(id, entry);
      continue;
    };

    if existing.source != entry.source {
      return Err(ManifestError::ConflictingSource {
        first: existing.source.clone(),
        second: entry.source.clone(),
        package: id,
      });
    }
    if *existing != entry {
      return Err(ManifestError::DuplicatePackage(id));
    }
    warn!(package = %id, "ignoring duplicate lock entry");
  }

  Ok(entries)
}

fn resolve_dependency(
  package: &PackageId,
  raw: &str,
  entries: &BTreeMap<PackageId, &LockedPackage>,
  by_name: &BTreeMap<&str, Vec<&PackageId>>,
) -> Result<PackageId, ManifestError> {
  let dep = DependencyRef::parse(raw).ok_or_else(|| ManifestError::InvalidDependency {
    package: package.clone(),
    entry: raw.to_string(),
  })?;

  let dangling = || ManifestError::DanglingDependency {
    package: package.clone(),
    dependency: raw.to_string(),
  };

  match dep.version {
    Some(version) => {
      let id = PackageId::new(dep.name, version);
      if entries.contains_key(&id) { Ok(id) } else { Err(dangling()) }
    }
    None => match by_name.get(dep.name).map(Vec::as_slice) {
      None | Some([]) => Err(dangling()),
      Some([only]) => Ok((*only).clone()),
      Some(candidates) => Err(ManifestError::AmbiguousDependency {
        package: package.clone(),
        dependency: raw.to_string(),
        candidates: candidates.iter().map(|c| c.to_string()).collect(),
      }),
    },
  }
}

/// Topologically sort the nodes, failing on the first cycle.
fn dependency_order(nodes: &BTreeMap<PackageId, PackageNode>) -> Result<Vec<PackageId>, ManifestError> {
  let mut graph: DiGraph<&PackageId, ()> = DiGraph::new();
  let mut indices = HashMap::new();

  for id in nodes.keys() {
    indices.insert(id, graph.add_node(id));
  }

  for node in nodes.values() {
    for dep in &node.dependencies {
      // Edge from dependency to dependent
      graph.add_edge(indices[dep], indices[&node.id], ());
    }
  }

  let sorted = toposort(&graph, None).map_err(|cycle| ManifestError::Cycle(graph[cycle.node_id()].clone()))?;
  Ok(sorted.into_iter().map(|idx| graph[idx].clone()).collect())
}
