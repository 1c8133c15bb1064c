//! Integration tests for `lockplan plan`.

use predicates::prelude::*;

use super::common::{TestEnv, fixture_content};

/// Chain fixture with its three package directories and the shared config.
fn chain_env() -> TestEnv {
  let env = TestEnv::from_fixture("chain.lock");
  for dir in ["app", "core", "util"] {
    env.write_crate(dir);
  }
  env.write_file("libtorch/lib/libtorch.so", "shared object\n");
  env.write_file("libtorch-dev/include/torch.h", "#pragma once\n");
  env.write_file("lockplan.toml", &fixture_content("lockplan.toml"));
  env
}

fn plan_json(env: &TestEnv) -> serde_json::Value {
  let output = env
    .lockplan_cmd()
    .arg("plan")
    .arg(env.lock_path())
    .args(["--format", "json"])
    .output()
    .unwrap();
  assert!(
    output.status.success(),
    "plan failed: {}",
    String::from_utf8_lossy(&output.stderr)
  );
  serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn plan_text_lists_waves_in_dependency_order() {
  let env = chain_env();

  let output = env.lockplan_cmd().arg("plan").arg(env.lock_path()).output().unwrap();
  assert!(output.status.success());

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Units: 3"));
  assert!(stdout.contains("Waves: 3"));
  assert!(stdout.contains("Natives: 1"));

  let util = stdout.find("util@0.1.0").unwrap();
  let core = stdout.find("core@0.1.0").unwrap();
  let app = stdout.find("app@0.1.0").unwrap();
  assert!(util < core && core < app, "unexpected order:\n{stdout}");
}

#[test]
fn plan_verbose_shows_commands_and_env() {
  let env = chain_env();

  env
    .lockplan_cmd()
    .args(["--verbose", "plan"])
    .arg(env.lock_path())
    .assert()
    .success()
    .stdout(predicate::str::contains("cargo build --release --offline --package core@0.1.0"))
    .stdout(predicate::str::contains("LIBTORCH="))
    .stdout(predicate::str::contains("native: libtorch"));
}

#[test]
fn plan_json_resolves_native_placeholder() {
  let env = chain_env();
  let json = plan_json(&env);

  let order: Vec<&str> = json["plan"]["order"]
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v.as_str().unwrap())
    .collect();
  assert_eq!(order, vec!["util@0.1.0", "core@0.1.0", "app@0.1.0"]);

  let store_path = json["plan"]["natives"]["libtorch"]["store_path"].as_str().unwrap();
  let libtorch_env = json["plan"]["units"]["core@0.1.0"]["env"]["LIBTORCH"].as_str().unwrap();
  assert_eq!(libtorch_env, store_path);
  assert!(store_path.starts_with(env.store_path().to_str().unwrap()));

  assert!(json["plan"]["units"]["app@0.1.0"].get("env").is_none());
}

#[test]
fn plan_hash_is_stable_across_runs() {
  let env = chain_env();

  let first = plan_json(&env);
  let second = plan_json(&env);
  assert_eq!(first["hash"], second["hash"]);
}

#[test]
fn plan_hash_changes_with_overrides() {
  let env = chain_env();
  let before = plan_json(&env);

  let config = fixture_content("lockplan.toml") + "\n[overrides.util]\nbuild_tools = [\"cmake\"]\n";
  env.write_file("lockplan.toml", &config);
  let after = plan_json(&env);

  assert_ne!(before["hash"], after["hash"]);
  assert_eq!(after["plan"]["units"]["util@0.1.0"]["build_tools"][0], "cmake");
}

#[test]
fn plan_writes_out_file() {
  let env = chain_env();
  let out = env.path("plan.json");

  env
    .lockplan_cmd()
    .arg("plan")
    .arg(env.lock_path())
    .arg("--out")
    .arg(&out)
    .assert()
    .success()
    .stdout(predicate::str::contains("Wrote plan to"));

  let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
  assert_eq!(written["units"].as_object().unwrap().len(), 3);
}

#[test]
fn plan_materialize_creates_native_tree() {
  let env = chain_env();
  let json = plan_json(&env);
  let store_path = std::path::PathBuf::from(json["plan"]["natives"]["libtorch"]["store_path"].as_str().unwrap());

  env
    .lockplan_cmd()
    .arg("plan")
    .arg(env.lock_path())
    .arg("--materialize")
    .assert()
    .success()
    .stdout(predicate::str::contains("Materialized 1 native dependency tree(s)"));

  assert!(store_path.join("lib/libtorch.so").exists());
  assert!(store_path.join("include/torch.h").exists());
}

#[test]
fn plan_restricted_package_names_offender() {
  let env = TestEnv::from_fixture("restricted.lock");
  env.write_crate("app");
  env.write_file("lockplan.toml", "[gate]\nallowed_licenses = [\"MIT\"]\n");

  env
    .lockplan_cmd()
    .arg("plan")
    .arg(env.lock_path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("blob@2.0.0"))
    .stderr(predicate::str::contains("Proprietary"));
}

#[test]
fn plan_cycle_fails() {
  let env = TestEnv::from_fixture("cycle.lock");
  env.write_crate("a");
  env.write_crate("b");
  env.write_file("lockplan.toml", "[gate]\nallowed_licenses = [\"MIT\"]\n");

  env
    .lockplan_cmd()
    .arg("plan")
    .arg(env.lock_path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("cycle"));
}

#[test]
fn plan_explicit_config_overrides_discovery() {
  let env = chain_env();
  env.write_file("strict.toml", "[gate]\nallowed_licenses = [\"MIT\"]\n");

  env
    .lockplan_cmd()
    .arg("plan")
    .arg(env.lock_path())
    .arg("--config")
    .arg(env.path("strict.toml"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("core@0.1.0"));
}

#[test]
fn plan_invalid_override_fails() {
  let env = chain_env();
  env.write_file(
    "lockplan.toml",
    "[gate]\nallowed_licenses = [\"MIT\", \"Apache-2.0\"]\n\n[overrides.app]\nnative_inputs = [\"cuda\"]\n",
  );

  env
    .lockplan_cmd()
    .arg("plan")
    .arg(env.lock_path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("cuda"));
}
