//! Default build unit generation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::BuildUnit;
use crate::filter::{FilterError, PatternSet};
use crate::manifest::PackageNode;

/// Source patterns applied when the configuration names none.
pub const DEFAULT_SOURCE_PATTERNS: &[&str] = &[
  r"(.*/)?Cargo\.toml",
  r"Cargo\.lock",
  r"(.*/)?build\.rs",
  r".*\.rs",
];

/// Build step applied when the configuration names none.
pub const DEFAULT_COMMAND: &str = "cargo build --release --offline --package {name}@{version}";

/// Generator defaults, shared by every package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
  pub source_patterns: Vec<String>,
  /// Step templates. `{name}` and `{version}` are replaced per package.
  pub command: Vec<String>,
}

impl Default for GeneratorConfig {
  fn default() -> Self {
    Self {
      source_patterns: DEFAULT_SOURCE_PATTERNS.iter().map(|p| p.to_string()).collect(),
      command: vec![DEFAULT_COMMAND.to_string()],
    }
  }
}

/// Produces the default unit for a package.
///
/// Holds the compiled pattern set so generation itself cannot fail and needs
/// no filesystem access.
#[derive(Debug, Clone)]
pub struct Generator {
  patterns: PatternSet,
  command: Vec<String>,
}

impl Generator {
  pub fn new(config: &GeneratorConfig) -> Result<Self, FilterError> {
    Ok(Self {
      patterns: PatternSet::new(&config.source_patterns)?,
      command: config.command.clone(),
    })
  }

  pub fn patterns(&self) -> &PatternSet {
    &self.patterns
  }

  /// The default unit: generator patterns over the node's source root,
  /// templated command, no environment, the node's edges, no native inputs
  /// and no build tools.
  pub fn generate(&self, node: &PackageNode) -> BuildUnit {
    BuildUnit {
      id: node.id.clone(),
      source: node.source.tree().with_patterns(self.patterns.clone()),
      command: self.command.iter().map(|step| render_step(step, node)).collect(),
      env: BTreeMap::new(),
      dependencies: node.dependencies.clone(),
      native_inputs: Default::default(),
      build_tools: Vec::new(),
      checksum: node.checksum.clone(),
    }
  }
}

/// Generate a single unit with the given configuration.
pub fn generate(node: &PackageNode, config: &GeneratorConfig) -> Result<BuildUnit, FilterError> {
  Ok(Generator::new(config)?.generate(node))
}

fn render_step(template: &str, node: &PackageNode) -> String {
  template.replace("{name}", node.name()).replace("{version}", node.version())
}
