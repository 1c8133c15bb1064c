mod filter;
mod info;
mod join;
mod plan;

pub use filter::cmd_filter;
pub use info::cmd_info;
pub use join::cmd_join;
pub use plan::cmd_plan;
