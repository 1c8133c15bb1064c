//! Planning configuration (`lockplan.toml`).
//!
//! ```toml
//! store_dir = "/var/lib/lockplan/store"
//!
//! [gate]
//! allowed_licenses = ["MIT", "Apache-2.0"]
//!
//! [generator]
//! source_patterns = ["Cargo\\.toml", ".*\\.rs"]
//! command = ["cargo build --release --offline -p {name}@{version}"]
//!
//! [native.libtorch]
//! outputs = ["/opt/libtorch-dev", "/opt/libtorch"]
//!
//! [overrides.torch-sys]
//! native_inputs = ["libtorch"]
//! env = { LIBTORCH = "$${native:libtorch}" }
//! ```
//!
//! Every section is optional. Relative paths are anchored at the directory of
//! the configuration file.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::build::GeneratorConfig;
use crate::consts::CONFIG_FILENAME;
use crate::gate::GatePolicy;
use crate::join::{JoinError, JoinedPath};
use crate::overrides::{OverrideRegistry, OverrideSpec};
use crate::platform::paths::{default_store_dir, store_dir_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: toml::de::Error,
  },
}

/// A native dependency: output directories joined into one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeSpec {
  /// Lowest precedence first.
  pub outputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanConfig {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub store_dir: Option<PathBuf>,
  pub gate: GatePolicy,
  pub generator: GeneratorConfig,
  pub native: BTreeMap<String, NativeSpec>,
  pub overrides: BTreeMap<String, OverrideSpec>,
}

impl PlanConfig {
  /// Parse configuration text. Relative paths are left as written.
  pub fn parse(content: &str) -> Result<Self, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
      path: "<inline>".to_string(),
      source,
    })
  }

  /// Load a configuration file, anchoring relative paths at its directory.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.display().to_string(),
      source,
    })?;
    let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.display().to_string(),
      source,
    })?;

    let base_dir = path.parent().unwrap_or(Path::new("."));
    config.anchor_paths(base_dir);
    debug!(
      path = %path.display(),
      natives = config.native.len(),
      overrides = config.overrides.len(),
      "loaded config"
    );
    Ok(config)
  }

  /// Load `lockplan.toml` from `dir` if present, defaults otherwise.
  pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    if path.exists() {
      Self::load(&path)
    } else {
      debug!(dir = %dir.display(), "no config file, using defaults");
      Ok(Self::default())
    }
  }

  fn anchor_paths(&mut self, base_dir: &Path) {
    let anchor = |p: &mut PathBuf| {
      if p.is_relative() {
        *p = base_dir.join(&*p);
      }
    };
    if let Some(store_dir) = self.store_dir.as_mut() {
      anchor(store_dir);
    }
    for spec in self.native.values_mut() {
      spec.outputs.iter_mut().for_each(anchor);
    }
  }

  /// Store directory: `LOCKPLAN_STORE`, then `store_dir`, then the data dir default.
  pub fn resolve_store_dir(&self) -> PathBuf {
    store_dir_from_env()
      .or_else(|| self.store_dir.clone())
      .unwrap_or_else(default_store_dir)
  }

  /// Override registry holding every `[overrides.NAME]` section.
  pub fn registry(&self) -> OverrideRegistry {
    OverrideRegistry::from_specs(&self.overrides)
  }

  /// The joined path for a `[native.NAME]` entry, `None` if not configured.
  pub fn joined_path(&self, name: &str) -> Option<Result<JoinedPath, JoinError>> {
    self
      .native
      .get(name)
      .map(|spec| JoinedPath::new(name, spec.outputs.clone()))
  }
}
