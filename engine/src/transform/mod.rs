//! Transformation module.
//!
//! - DSL: Descriptors, chains, matrices and the join engine
//! - Pipeline: File-level runs with matrix lookup

pub mod dsl;
pub mod pipeline;

pub use dsl::*;
pub use pipeline::*;
