//! Property tests for filter composition, override identity and planning.

use std::collections::BTreeSet;
use std::path::Path;

use proptest::prelude::*;

use lockplan_lib::build::{BuildUnit, Generator, GeneratorConfig};
use lockplan_lib::config::PlanConfig;
use lockplan_lib::filter::SourceTree;
use lockplan_lib::gate::GatePolicy;
use lockplan_lib::manifest::{LockFile, LockedPackage, PackageGraph};
use lockplan_lib::overrides::OverrideRegistry;
use lockplan_lib::plan::Planner;

const PATTERNS: &[&str] = &[
  r"Cargo\.toml",
  r".*\.rs",
  r"src/.*",
  r"build\.rs",
  r"benches/.*",
  r".*\.md",
  r"include/.*\.h",
];

const PATHS: &[&str] = &[
  "Cargo.toml",
  "Cargo.lock",
  "build.rs",
  "src/lib.rs",
  "src/data.bin",
  "benches/bench.rs",
  "README.md",
  "include/api.h",
  "docs/guide.md",
];

fn arb_patterns() -> impl Strategy<Value = Vec<&'static str>> {
  prop::collection::vec(prop::sample::select(PATTERNS), 0..5)
}

/// Packages `p0..pn`, each depending on a subset of lower-numbered packages.
fn arb_lock() -> impl Strategy<Value = LockFile> {
  (1usize..8)
    .prop_flat_map(|n| (Just(n), prop::collection::vec(prop::collection::vec(any::<bool>(), n), n)))
    .prop_map(|(n, edges)| {
      let mut lock = LockFile::new();
      for (i, row) in edges.iter().enumerate().take(n) {
        let deps: Vec<String> = (0..i).filter(|&j| row[j]).map(|j| format!("p{j}")).collect();
        let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
        lock.push(
          LockedPackage::new(&format!("p{i}"), "1.0.0", "registry+https://example.com/index", "MIT")
            .with_dependencies(&deps),
        );
      }
      lock
    })
}

proptest! {
  #[test]
  fn chained_filters_equal_union(p in arb_patterns(), q in arb_patterns()) {
    let root = SourceTree::local("/src/pkg");
    let chained = root.filter(&p).unwrap().filter(&q).unwrap();
    let union: Vec<&str> = p.iter().chain(q.iter()).copied().collect();
    let direct = root.filter(&union).unwrap();

    prop_assert_eq!(&chained, &direct);
    for path in PATHS {
      prop_assert_eq!(chained.includes(path, false), direct.includes(path, false));
    }
  }

  #[test]
  fn refiltering_with_same_patterns_is_idempotent(p in arb_patterns()) {
    let once = SourceTree::local("/src/pkg").filter(&p).unwrap();
    let twice = once.filter(&p).unwrap();
    prop_assert_eq!(once, twice);
  }

  #[test]
  fn absent_override_is_identity(lock in arb_lock()) {
    let graph = PackageGraph::from_lock(&lock, Path::new("/work")).unwrap();
    let generator = Generator::new(&GeneratorConfig::default()).unwrap();
    let mut registry = OverrideRegistry::new();
    registry.register("not-in-graph", |unit: BuildUnit| unit.with_env("X", "1"));

    for node in graph.nodes() {
      let default = generator.generate(node);
      prop_assert_eq!(registry.resolve(node, default.clone()).unwrap(), default);
    }
  }

  #[test]
  fn patch_does_not_touch_other_units(lock in arb_lock()) {
    let graph = PackageGraph::from_lock(&lock, Path::new("/work")).unwrap();
    let config = PlanConfig {
      gate: GatePolicy::new(["MIT"]),
      ..Default::default()
    };
    let base = Planner::new(&config).unwrap().with_store_dir("/store").plan(&graph).unwrap();
    let patched = Planner::new(&config)
      .unwrap()
      .with_store_dir("/store")
      .with_patch("p0", |unit: BuildUnit| unit.with_build_tool("cmake"))
      .plan(&graph)
      .unwrap();

    for unit in base.units().filter(|u| u.name() != "p0") {
      prop_assert_eq!(patched.unit(&unit.id), Some(unit));
    }
  }

  #[test]
  fn acyclic_graph_plans_one_unit_per_node(lock in arb_lock()) {
    let graph = PackageGraph::from_lock(&lock, Path::new("/work")).unwrap();
    let config = PlanConfig {
      gate: GatePolicy::new(["MIT"]),
      ..Default::default()
    };
    let plan = Planner::new(&config).unwrap().with_store_dir("/store").plan(&graph).unwrap();

    prop_assert_eq!(plan.len(), graph.len());

    let mut seen = BTreeSet::new();
    for id in plan.topological_order() {
      for dep in plan.dependencies(id) {
        prop_assert!(seen.contains(dep), "{} came before its dependency {}", id, dep);
      }
      seen.insert(id.clone());
    }
    prop_assert_eq!(seen.len(), graph.len());

    for node in graph.nodes() {
      prop_assert_eq!(&plan.unit(&node.id).unwrap().dependencies, &node.dependencies);
    }
  }
}
