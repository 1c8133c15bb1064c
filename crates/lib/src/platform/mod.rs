//! Platform-specific helpers: well-known directories and filesystem links.

pub mod link;
pub mod paths;
