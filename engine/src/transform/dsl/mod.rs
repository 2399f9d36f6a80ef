//! Declarative nesting DSL
//!
//! This module provides:
//! - `matrix`: Descriptor, chain and matrix definitions (what callers write)
//! - `index`: Identifier dictionaries and the per-entity join step
//! - `executor`: Apply a matrix of chains to a document
//! - `ordering`: Flat, unordered dependency lists applied in place
//!
//! ## Usage Flow
//!
//! ```text
//! matrix JSON → DependencyMatrix::from_value → transform_with(document) → nested copy
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use nestor::transform::dsl::{example_document, example_matrix, transform_with, TransformOptions};
//!
//! let report = transform_with(&example_matrix(), &example_document(), &TransformOptions::default())?;
//! println!("{}", report.summary());
//! assert_eq!(report.document["content"]["performances"][0]["event"]["venue"]["venueID"], "b");
//! ```

pub mod executor;
pub mod index;
pub mod matrix;
pub mod ordering;

// Re-exports for convenience
pub use executor::{transform, transform_with, ChainReport, TransformOptions, TransformReport};
pub use index::{attach, AttachStats, Attached, IdIndex, IdKey, UnmatchedPolicy};
pub use matrix::{example_document, example_matrix, example_matrix_value, Chain, DependencyMatrix, Descriptor, Hop};
pub use ordering::{example_list_value, transform_flat, DependencyList};
