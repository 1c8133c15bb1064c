//! Cross-platform symlink creation.

use std::io;
use std::path::Path;

/// Create a symlink at `link` pointing to `target`.
///
/// On Windows the link flavour follows the target: directory links for
/// directories, file links otherwise.
pub fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  #[cfg(unix)]
  {
    std::os::unix::fs::symlink(target, link)
  }
  #[cfg(windows)]
  {
    if target.is_dir() {
      std::os::windows::fs::symlink_dir(target, link)
    } else {
      std::os::windows::fs::symlink_file(target, link)
    }
  }
}
