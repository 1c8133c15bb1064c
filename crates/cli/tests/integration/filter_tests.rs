//! Integration tests for `lockplan filter`.

use predicates::prelude::*;

use super::common::TestEnv;

fn crate_env() -> TestEnv {
  let env = TestEnv::empty();
  env.write_crate("pkg");
  env.write_file("pkg/src/util/mod.rs", "pub mod x;\n");
  env.write_file("pkg/static/index.html", "<html></html>\n");
  env
}

#[test]
fn filter_lists_selected_files() {
  let env = crate_env();

  env
    .lockplan_cmd()
    .arg("filter")
    .arg(env.path("pkg"))
    .args(["Cargo\\.toml", ".*\\.rs"])
    .assert()
    .success()
    .stdout(predicate::str::contains("src/lib.rs"))
    .stdout(predicate::str::contains("src/util/mod.rs"))
    .stdout(predicate::str::contains("README.md").not())
    .stdout(predicate::str::contains("static/index.html").not());
}

#[test]
fn filter_json_hash_ignores_unselected_files() {
  let env = crate_env();
  let run = || {
    let output = env
      .lockplan_cmd()
      .arg("filter")
      .arg(env.path("pkg"))
      .args(["src/.*", "--format", "json"])
      .output()
      .unwrap();
    assert!(output.status.success());
    serde_json::from_slice::<serde_json::Value>(&output.stdout).unwrap()
  };

  let before = run();
  assert_eq!(before["files"].as_array().unwrap().len(), 2);

  env.write_file("pkg/README.md", "rewritten\n");
  let after = run();
  assert_eq!(before["hash"], after["hash"]);

  env.write_file("pkg/src/lib.rs", "pub fn g() {}\n");
  let changed = run();
  assert_ne!(before["hash"], changed["hash"]);
}

#[test]
fn filter_without_patterns_selects_everything() {
  let env = crate_env();

  env
    .lockplan_cmd()
    .arg("filter")
    .arg(env.path("pkg"))
    .assert()
    .success()
    .stdout(predicate::str::contains("README.md"))
    .stdout(predicate::str::contains("static/index.html"));
}

#[test]
fn filter_missing_directory_fails() {
  let env = TestEnv::empty();

  env
    .lockplan_cmd()
    .arg("filter")
    .arg(env.path("nope"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to resolve directory"));
}
