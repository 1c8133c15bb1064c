//! Library integration tests.

mod common;
mod plan_tests;
mod property_tests;
