use lockplan_lib::consts::{CONFIG_FILENAME, STORE_ENV_VAR};
use lockplan_lib::manifest::{LOCK_FILENAME, LOCK_VERSION};
use lockplan_lib::platform::paths::{default_store_dir, store_dir_from_env};

use crate::output::print_stat;

pub fn cmd_info() {
  println!("lockplan {}", env!("CARGO_PKG_VERSION"));
  match store_dir_from_env() {
    Some(store) => print_stat("Store", &format!("{} (from {})", store.display(), STORE_ENV_VAR)),
    None => print_stat("Store", &default_store_dir().display().to_string()),
  }
  print_stat("Lock file", &format!("{} (version {})", LOCK_FILENAME, LOCK_VERSION));
  print_stat("Config file", CONFIG_FILENAME);
}
