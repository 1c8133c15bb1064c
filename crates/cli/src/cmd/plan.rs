//! Implementation of the `lockplan plan` command.
//!
//! Reads a lock file and configuration, plans one build unit per package and
//! prints the plan. Optionally writes the plan as JSON and materializes the
//! joined native dependencies.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use lockplan_lib::config::PlanConfig;
use lockplan_lib::manifest::PackageGraph;
use lockplan_lib::plan::plan;
use lockplan_lib::util::hash::Hashable;

use crate::output::{
  OutputFormat, format_duration, print_info, print_json, print_stat, print_success, symbols, truncate_hash,
};

pub fn cmd_plan(
  lock: &Path,
  config: Option<&Path>,
  output: OutputFormat,
  out: Option<&Path>,
  materialize: bool,
  verbose: bool,
) -> Result<()> {
  let start = Instant::now();

  let mut config = match config {
    Some(path) => PlanConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))?,
    None => {
      let dir = lock.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
      PlanConfig::discover(dir).with_context(|| format!("Failed to load config from {}", dir.display()))?
    }
  };

  config.store_dir = Some(config.resolve_store_dir());

  debug!(lock = %lock.display(), natives = config.native.len(), overrides = config.overrides.len(), "planning");
  let graph = PackageGraph::load(lock).with_context(|| format!("Failed to load lock file: {}", lock.display()))?;
  let plan = plan(&graph, &config).context("Failed to plan build")?;
  let hash = plan.compute_hash().context("Failed to compute plan hash")?;

  if let Some(out) = out {
    let json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
    fs::write(out, json).with_context(|| format!("Failed to write plan: {}", out.display()))?;
  }

  let materialized = if materialize {
    plan
      .materialize_natives()
      .context("Failed to materialize native dependencies")?
  } else {
    Vec::new()
  };

  if output.is_json() {
    print_json(&serde_json::json!({ "hash": hash, "plan": plan }))?;
    return Ok(());
  }

  print_success(&format!("Plan: {}", truncate_hash(&hash.0)));
  print_stat("Units", &plan.len().to_string());
  print_stat("Edges", &plan.edge_count().to_string());
  print_stat("Waves", &plan.waves().len().to_string());
  print_stat("Natives", &plan.natives().len().to_string());

  println!();
  for (index, wave) in plan.waves().iter().enumerate() {
    println!("Wave {}:", index + 1);
    for id in wave {
      println!("  {} {}", symbols::INFO, id);
      if verbose && let Some(unit) = plan.unit(id) {
        for step in &unit.command {
          println!("      $ {}", step);
        }
        for (key, value) in &unit.env {
          println!("      {}={}", key, value);
        }
        for native in &unit.native_inputs {
          println!("      native: {}", native);
        }
      }
    }
  }

  if !plan.natives().is_empty() {
    println!();
    println!("Natives:");
    for (name, native) in plan.natives() {
      println!("  {} {} {} {}", symbols::INFO, name, symbols::ARROW, native.store_path.display());
    }
  }

  if let Some(out) = out {
    println!();
    print_info(&format!("Wrote plan to {}", out.display()));
  }
  if !materialized.is_empty() {
    print_info(&format!("Materialized {} native dependency tree(s)", materialized.len()));
  }

  println!();
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}
