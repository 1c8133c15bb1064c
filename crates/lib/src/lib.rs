//! lockplan-lib: build plans from locked dependency graphs
//!
//! This crate turns a lock file into one build unit per package:
//! - `manifest`: the validated package graph read from the lock file
//! - `filter`: source slices anchored at a package's original root
//! - `build`: build units and the default generator
//! - `overrides`: per-package patches layered over generated units
//! - `gate`: license allow-list checked before any unit is generated
//! - `join`: several output directories presented as one path
//! - `plan`: the planner and the resulting `BuildPlan` DAG

pub mod build;
pub mod config;
pub mod consts;
pub mod filter;
pub mod gate;
pub mod join;
pub mod manifest;
pub mod overrides;
pub mod placeholder;
pub mod plan;
pub mod platform;
pub mod util;
