//! Implementation of the `lockplan join` command.
//!
//! Without `--store` this prints the merged view of the input directories.
//! With it, the joined tree is materialized into the store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use lockplan_lib::join::JoinedPath;

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success, symbols};

pub fn cmd_join(name: &str, dirs: Vec<PathBuf>, store: Option<&Path>, output: OutputFormat) -> Result<()> {
  let dirs = dirs
    .iter()
    .map(|dir| dunce::canonicalize(dir).with_context(|| format!("Failed to resolve directory: {}", dir.display())))
    .collect::<Result<Vec<_>>>()?;
  let joined = JoinedPath::new(name, dirs)?;
  let store_name = joined.store_name()?;

  let materialized = match store {
    Some(store) => Some(
      joined
        .materialize(store)
        .with_context(|| format!("Failed to materialize {} into {}", name, store.display()))?,
    ),
    None => None,
  };
  let entries = joined.entries().context("Failed to read input directories")?;

  if output.is_json() {
    print_json(&serde_json::json!({
      "name": name,
      "store_name": store_name,
      "path": materialized,
      "entries": entries,
    }))?;
    return Ok(());
  }

  match &materialized {
    Some(path) => print_success(&format!("Joined {} at {}", name, path.display())),
    None => {
      for (rel, source) in &entries {
        println!("  {} {} {}", rel, symbols::ARROW, source.display());
      }
      println!();
      print_info(&format!("{} entries from {} input(s)", entries.len(), joined.paths.len()));
    }
  }
  print_stat("Store name", &store_name);

  Ok(())
}
