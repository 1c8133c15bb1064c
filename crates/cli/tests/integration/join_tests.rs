//! Integration tests for `lockplan join`.

use predicates::prelude::*;

use super::common::TestEnv;

fn split_outputs() -> TestEnv {
  let env = TestEnv::empty();
  env.write_file("libtorch/lib/libtorch.so", "runtime\n");
  env.write_file("libtorch/share/version", "1\n");
  env.write_file("libtorch-dev/include/torch.h", "#pragma once\n");
  env.write_file("libtorch-dev/share/version", "2\n");
  env
}

#[test]
fn join_lists_merged_entries() {
  let env = split_outputs();

  env
    .lockplan_cmd()
    .args(["join", "libtorch"])
    .arg(env.path("libtorch"))
    .arg(env.path("libtorch-dev"))
    .assert()
    .success()
    .stdout(predicate::str::contains("lib/libtorch.so"))
    .stdout(predicate::str::contains("include/torch.h"))
    .stdout(predicate::str::contains("3 entries from 2 input(s)"));
}

#[test]
fn join_later_input_wins() {
  let env = split_outputs();

  let output = env
    .lockplan_cmd()
    .args(["join", "libtorch", "--format", "json"])
    .arg(env.path("libtorch"))
    .arg(env.path("libtorch-dev"))
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let version = json["entries"]["share/version"].as_str().unwrap();
  assert!(version.contains("libtorch-dev"), "unexpected source: {version}");
  assert!(json["path"].is_null());
  assert!(json["store_name"].as_str().unwrap().ends_with("-libtorch"));
}

#[test]
fn join_materializes_into_store() {
  let env = split_outputs();
  let store = env.store_path();

  let output = env
    .lockplan_cmd()
    .args(["join", "libtorch", "--format", "json"])
    .arg(env.path("libtorch"))
    .arg(env.path("libtorch-dev"))
    .arg("--store")
    .arg(&store)
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let path = std::path::PathBuf::from(json["path"].as_str().unwrap());
  assert!(path.starts_with(&store));
  assert_eq!(std::fs::read_to_string(path.join("share/version")).unwrap(), "2\n");
  assert!(path.join("lib/libtorch.so").exists());
}

#[test]
fn join_missing_input_fails() {
  let env = split_outputs();

  env
    .lockplan_cmd()
    .args(["join", "libtorch"])
    .arg(env.path("libtorch"))
    .arg(env.path("missing"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("missing"));
}
