//! Crate-wide constants.

/// Application name, used for data directories and default file names.
pub const APP_NAME: &str = "lockplan";

/// Length of truncated object hashes used in store names.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Environment variable that overrides the store directory.
pub const STORE_ENV_VAR: &str = "LOCKPLAN_STORE";

/// Default configuration file name, looked up next to the lock file.
pub const CONFIG_FILENAME: &str = "lockplan.toml";
