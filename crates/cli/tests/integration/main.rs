//! CLI integration tests.

mod filter_tests;
mod join_tests;
mod plan_tests;
