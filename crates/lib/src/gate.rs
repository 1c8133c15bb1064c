//! License gate.
//!
//! Every package must carry a license tag that the configured allow-list
//! names explicitly. Nothing is inferred: an SPDX expression such as
//! `MIT OR Apache-2.0` is compared as a whole string, not evaluated.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manifest::{PackageId, PackageNode};

/// A package was denied by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("package {package} is restricted: license '{license}' is not in the allow-list")]
pub struct RestrictedPackage {
  pub package: PackageId,
  pub license: String,
}

/// Allow-list of license tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
  #[serde(default)]
  pub allowed_licenses: BTreeSet<String>,
}

impl GatePolicy {
  pub fn new<I, S>(allowed: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      allowed_licenses: allowed.into_iter().map(Into::into).collect(),
    }
  }

  pub fn allow(&mut self, license: &str) {
    self.allowed_licenses.insert(license.to_string());
  }

  pub fn revoke(&mut self, license: &str) {
    self.allowed_licenses.remove(license);
  }

  /// Whether a license tag is allowed.
  pub fn permits(&self, license: &str) -> bool {
    self.allowed_licenses.contains(license)
  }

  /// Check a node, naming it and its tag on denial.
  pub fn check(&self, node: &PackageNode) -> Result<(), RestrictedPackage> {
    if self.permits(&node.license) {
      Ok(())
    } else {
      Err(RestrictedPackage {
        package: node.id.clone(),
        license: node.license.clone(),
      })
    }
  }
}
