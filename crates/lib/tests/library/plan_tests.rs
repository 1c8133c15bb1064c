//! End-to-end planning from a lock file on disk.

use std::path::{Path, PathBuf};

use lockplan_lib::build::BuildUnit;
use lockplan_lib::config::{NativeSpec, PlanConfig};
use lockplan_lib::manifest::{LockedPackage, ManifestError, PackageGraph, PackageId};
use lockplan_lib::overrides::OverrideSpec;
use lockplan_lib::plan::{BuildPlan, PlanError, Planner};

use super::common::{Workspace, chain_workspace, config};

fn id(name: &str) -> PackageId {
  PackageId::new(name, "0.1.0")
}

fn plan_with(config: &PlanConfig, lock: &Path, store: PathBuf) -> Result<BuildPlan, PlanError> {
  let graph = PackageGraph::load(lock)?;
  Planner::new(config)?.with_store_dir(store).plan(&graph)
}

mod chain {
  use super::*;

  #[test]
  fn three_units_with_matching_edges() {
    let (ws, lock) = chain_workspace();
    let plan = plan_with(&config(&["MIT"], &ws.store()), &lock, ws.store()).unwrap();

    assert_eq!(plan.len(), 3);
    assert_eq!(plan.dependencies(&id("a")), vec![&id("b")]);
    assert_eq!(plan.dependencies(&id("b")), vec![&id("c")]);
    assert!(plan.dependencies(&id("c")).is_empty());
    assert_eq!(plan.topological_order(), &[id("c"), id("b"), id("a")]);
  }

  #[test]
  fn units_see_only_cargo_sources() {
    let (ws, lock) = chain_workspace();
    let plan = plan_with(&config(&["MIT"], &ws.store()), &lock, ws.store()).unwrap();

    let unit = plan.unit(&id("a")).unwrap();
    assert_eq!(unit.source.files().unwrap(), vec!["Cargo.toml", "src/lib.rs"]);
  }

  #[test]
  fn removing_c_license_restricts_c() {
    let ws = Workspace::new();
    ws.write_crate("a", "a");
    ws.write_crate("b", "b");
    ws.write_crate("c", "c");
    let lock = ws.write_lock(vec![
      LockedPackage::new("a", "0.1.0", "path:a", "MIT").with_dependencies(&["b"]),
      LockedPackage::new("b", "0.1.0", "path:b", "MIT").with_dependencies(&["c"]),
      LockedPackage::new("c", "0.1.0", "path:c", "BSD-3-Clause"),
    ]);

    let allowed = plan_with(&config(&["MIT", "BSD-3-Clause"], &ws.store()), &lock, ws.store());
    assert!(allowed.is_ok());

    let err = plan_with(&config(&["MIT"], &ws.store()), &lock, ws.store()).unwrap_err();
    match err {
      PlanError::RestrictedPackage(denied) => assert_eq!(denied.package, id("c")),
      other => panic!("expected RestrictedPackage, got {other:?}"),
    }
  }

  #[test]
  fn plan_is_deterministic() {
    let (ws, lock) = chain_workspace();
    let cfg = config(&["MIT"], &ws.store());

    let first = plan_with(&cfg, &lock, ws.store()).unwrap();
    let second = plan_with(&cfg, &lock, ws.store()).unwrap();

    assert_eq!(
      serde_json::to_string(&first).unwrap(),
      serde_json::to_string(&second).unwrap()
    );
  }
}

mod malformed {
  use super::*;

  #[test]
  fn dangling_edge_produces_no_plan() {
    let ws = Workspace::new();
    let lock = ws.write_lock(vec![
      LockedPackage::new("a", "0.1.0", "path:a", "MIT").with_dependencies(&["ghost"]),
    ]);

    let err = plan_with(&config(&["MIT"], &ws.store()), &lock, ws.store()).unwrap_err();

    assert!(matches!(
      err,
      PlanError::MalformedManifest(ManifestError::DanglingDependency { .. })
    ));
  }

  #[test]
  fn missing_lock_file() {
    let ws = Workspace::new();
    let err = plan_with(&config(&["MIT"], &ws.store()), &ws.lock_path(), ws.store()).unwrap_err();
    assert!(matches!(err, PlanError::MalformedManifest(ManifestError::Read { .. })));
  }
}

mod overrides {
  use super::*;

  #[test]
  fn source_override_widens_one_unit() {
    let (ws, lock) = chain_workspace();
    let mut cfg = config(&["MIT"], &ws.store());
    cfg.overrides.insert(
      "b".to_string(),
      OverrideSpec::new().with_source_patterns(&[r".*\.md", r"src/.*"]).unwrap(),
    );

    let plan = plan_with(&cfg, &lock, ws.store()).unwrap();

    assert_eq!(plan.unit(&id("b")).unwrap().source.files().unwrap(), vec!["README.md", "src/lib.rs"]);
    assert_eq!(plan.unit(&id("a")).unwrap().source.files().unwrap(), vec!["Cargo.toml", "src/lib.rs"]);
  }

  #[test]
  fn closure_patch_and_native_join_materialize() {
    let (ws, lock) = chain_workspace();
    ws.write_file("opt/dev/include/c.h", "// c");
    ws.write_file("opt/lib/lib/libc.so", "elf");

    let mut cfg = config(&["MIT"], &ws.store());
    cfg.native.insert(
      "clib".to_string(),
      NativeSpec {
        outputs: vec![ws.root().join("opt/dev"), ws.root().join("opt/lib")],
      },
    );

    let graph = PackageGraph::load(&lock).unwrap();
    let plan = Planner::new(&cfg)
      .unwrap()
      .with_store_dir(ws.store())
      .with_patch("c", |unit: BuildUnit| {
        unit.with_native_input("clib").with_env("CLIB_DIR", "$${native:clib}")
      })
      .plan(&graph)
      .unwrap();

    let paths = plan.materialize_natives().unwrap();
    assert_eq!(paths.len(), 1);

    let c = plan.unit(&id("c")).unwrap();
    let root = PathBuf::from(&c.env["CLIB_DIR"]);
    assert_eq!(root, paths[0]);
    assert!(root.join("include/c.h").exists());
    assert!(root.join("lib/libc.so").exists());
  }
}
