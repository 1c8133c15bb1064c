use std::path::PathBuf;

use crate::consts::{APP_NAME, STORE_ENV_VAR};

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE").map(PathBuf::from).unwrap_or_default()
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME").map(PathBuf::from).unwrap_or_default()
}

/// Returns the directory for data files for the application
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  let appdata = std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join("AppData").join("Roaming"));
  appdata.join(APP_NAME)
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// Default store directory: `<data_dir>/store`.
pub fn default_store_dir() -> PathBuf {
  data_dir().join("store")
}

/// Store directory from `LOCKPLAN_STORE`, if set and non-empty.
pub fn store_dir_from_env() -> Option<PathBuf> {
  std::env::var(STORE_ENV_VAR)
    .ok()
    .filter(|s| !s.is_empty())
    .map(PathBuf::from)
}
