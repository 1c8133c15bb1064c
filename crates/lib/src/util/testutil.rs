//! Test utilities for lockplan-lib.

use std::fs;
use std::path::Path;

/// Write `files` (relative path, content) under `root`, creating parents.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
  for (rel, content) in files {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }
}

/// A small crate layout: manifest, sources, docs and build output.
pub fn write_crate(root: &Path) {
  write_tree(
    root,
    &[
      ("Cargo.toml", "[package]\nname = \"demo\"\n"),
      ("Cargo.lock", "# lock\n"),
      ("build.rs", "fn main() {}\n"),
      ("src/lib.rs", "pub fn demo() {}\n"),
      ("src/util/mod.rs", "pub mod io;\n"),
      ("README.md", "# demo\n"),
      ("static/index.html", "<html></html>\n"),
    ],
  );
}
