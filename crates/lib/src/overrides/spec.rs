use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::Patch;
use crate::build::BuildUnit;
use crate::filter::{FilterError, PatternSet};

/// A declarative override, as written under `[overrides.NAME]`.
///
/// Applying it:
/// - replaces the source pattern set wholesale, re-anchored at the original root
/// - adds native inputs
/// - sets environment entries, replacing existing keys
/// - appends build tools not already listed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverrideSpec {
  #[serde(skip_serializing_if = "BTreeSet::is_empty")]
  pub native_inputs: BTreeSet<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub build_tools: Vec<String>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source_patterns: Option<PatternSet>,
}

impl OverrideSpec {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_native_input(mut self, name: &str) -> Self {
    self.native_inputs.insert(name.to_string());
    self
  }

  pub fn with_build_tool(mut self, tool: &str) -> Self {
    self.build_tools.push(tool.to_string());
    self
  }

  pub fn with_env(mut self, key: &str, value: &str) -> Self {
    self.env.insert(key.to_string(), value.to_string());
    self
  }

  pub fn with_source_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, FilterError> {
    self.source_patterns = Some(PatternSet::new(patterns)?);
    Ok(self)
  }
}

impl Patch for OverrideSpec {
  fn apply(&self, unit: BuildUnit) -> BuildUnit {
    let mut unit = unit;

    if let Some(patterns) = &self.source_patterns {
      unit.source = unit.source.with_patterns(patterns.clone());
    }
    unit.native_inputs.extend(self.native_inputs.iter().cloned());
    for (key, value) in &self.env {
      unit = unit.with_env(key, value);
    }
    for tool in &self.build_tools {
      unit = unit.with_build_tool(tool);
    }

    unit
  }
}
