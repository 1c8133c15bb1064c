use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::filter::SourceTree;
use crate::manifest::PackageId;
use crate::util::hash::Hashable;

/// Fully specified instructions to build one package.
///
/// Created by the generator, optionally replaced field-wise by an override
/// patch, and never mutated once a plan is assembled. The content hash covers
/// every field, so two units hash alike only if they would build alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildUnit {
  pub id: PackageId,
  /// The slice of the package's sources the build may read.
  pub source: SourceTree,
  /// Ordered build steps, each a shell command line.
  pub command: Vec<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, String>,
  /// Units that must be built first. Always equal to the package's edges.
  #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
  pub dependencies: BTreeSet<PackageId>,
  /// Native dependency identifiers, resolved to joined paths by the planner.
  #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
  pub native_inputs: BTreeSet<String>,
  /// Tools required on the build host, in the order they were added.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub build_tools: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub checksum: Option<String>,
}

impl Hashable for BuildUnit {}

impl BuildUnit {
  pub fn name(&self) -> &str {
    &self.id.name
  }

  pub fn version(&self) -> &str {
    &self.id.version
  }

  /// Set an environment entry, replacing any previous value.
  pub fn with_env(mut self, key: &str, value: &str) -> Self {
    self.env.insert(key.to_string(), value.to_string());
    self
  }

  pub fn with_native_input(mut self, name: &str) -> Self {
    self.native_inputs.insert(name.to_string());
    self
  }

  /// Append a build tool unless it is already listed.
  pub fn with_build_tool(mut self, tool: &str) -> Self {
    if !self.build_tools.iter().any(|t| t == tool) {
      self.build_tools.push(tool.to_string());
    }
    self
  }
}
