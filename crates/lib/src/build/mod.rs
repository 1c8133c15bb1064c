//! Build units.
//!
//! A build unit is everything needed to build one locked package: the slice of
//! sources it may read, its ordered steps, its environment, and the units and
//! native dependencies it needs first. Units are identified by package id and
//! content addressed by their serialized form, so identical inputs always
//! produce the same hash.
//!
//! # Submodules
//!
//! - [`generate`] - default unit per package node

pub mod generate;
mod types;

pub use generate::{Generator, GeneratorConfig};
pub use types::*;
