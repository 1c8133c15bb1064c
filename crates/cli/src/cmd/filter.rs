//! Implementation of the `lockplan filter` command.

use std::path::Path;

use anyhow::{Context, Result};

use lockplan_lib::filter::SourceTree;

use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

pub fn cmd_filter(dir: &Path, patterns: &[String], output: OutputFormat) -> Result<()> {
  let root = dunce::canonicalize(dir).with_context(|| format!("Failed to resolve directory: {}", dir.display()))?;
  let tree = SourceTree::local(&root);
  let tree = if patterns.is_empty() {
    tree
  } else {
    tree.filter(patterns).context("Invalid source pattern")?
  };

  let files = tree.files().context("Failed to read source tree")?;
  let hash = tree.content_hash().context("Failed to hash source tree")?;

  if output.is_json() {
    print_json(&serde_json::json!({
      "root": root,
      "patterns": patterns,
      "files": files,
      "hash": hash,
    }))?;
    return Ok(());
  }

  for file in &files {
    println!("  {} {}", symbols::INFO, file);
  }
  println!();
  print_info(&format!("{} file(s) selected from {}", files.len(), root.display()));
  print_stat("Hash", &hash.0);

  Ok(())
}
