//! Shared helpers for library integration tests.

use std::path::{Path, PathBuf};

use lockplan_lib::config::PlanConfig;
use lockplan_lib::gate::GatePolicy;
use lockplan_lib::manifest::{LOCK_FILENAME, LockFile, LockedPackage};
use tempfile::TempDir;

/// A workspace on disk with a lock file and package sources.
pub struct Workspace {
  pub temp: TempDir,
}

impl Workspace {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  pub fn lock_path(&self) -> PathBuf {
    self.temp.path().join(LOCK_FILENAME)
  }

  /// Write a file relative to the workspace root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Write a minimal crate under `dir`.
  pub fn write_crate(&self, dir: &str, name: &str) {
    self.write_file(
      &format!("{dir}/Cargo.toml"),
      &format!("[package]\nname = \"{name}\"\nversion = \"0.1.0\"\n"),
    );
    self.write_file(&format!("{dir}/src/lib.rs"), "pub fn f() {}\n");
    self.write_file(&format!("{dir}/README.md"), "docs\n");
  }

  pub fn write_lock(&self, packages: Vec<LockedPackage>) -> PathBuf {
    let mut lock = LockFile::new();
    for package in packages {
      lock.push(package);
    }
    let path = self.lock_path();
    lock.save(&path).unwrap();
    path
  }

  pub fn store(&self) -> PathBuf {
    self.root().join("store")
  }
}

/// A -> B -> C, all local path sources, all MIT.
pub fn chain_workspace() -> (Workspace, PathBuf) {
  let ws = Workspace::new();
  ws.write_crate("a", "a");
  ws.write_crate("b", "b");
  ws.write_crate("c", "c");
  let lock = ws.write_lock(vec![
    LockedPackage::new("a", "0.1.0", "path:a", "MIT").with_dependencies(&["b"]),
    LockedPackage::new("b", "0.1.0", "path:b", "MIT").with_dependencies(&["c 0.1.0"]),
    LockedPackage::new("c", "0.1.0", "path:c", "MIT"),
  ]);
  (ws, lock)
}

/// Configuration allowing `licenses`, with the store pinned to `store`.
pub fn config(licenses: &[&str], store: &Path) -> PlanConfig {
  PlanConfig {
    store_dir: Some(store.to_path_buf()),
    gate: GatePolicy::new(licenses.iter().copied()),
    ..Default::default()
  }
}
