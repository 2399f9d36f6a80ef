//! # Nestor - chain-based nesting for flat JSON entity collections
//!
//! Nestor takes a document holding flat, id-linked collections (venues,
//! events, performances...) and a dependency matrix describing how they
//! reference each other, and returns a copy where every foreign key is
//! joined with a full copy of the entity it points at.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Document   │────▶│  Resolver   │────▶│  Executor   │────▶│ Nested JSON │
//! │  (flat)     │     │ (dot paths) │     │ (hop joins) │     │  (copy)     │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                ▲
//!                     ┌─────────────┐     ┌──────┴──────┐
//!                     │ Matrix JSON │────▶│   Matrix    │
//!                     │  (chains)   │     │ (validated) │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nestor::{example_document, example_matrix_value, transform};
//!
//! let nested = transform(&example_matrix_value(), &example_document())?;
//! assert_eq!(nested["content"]["performances"][0]["event"]["venue"]["venueID"], "b");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`resolver`] - Dot-path lookup inside documents
//! - [`transform`] - Matrix model, join engine, flat lists and pipeline
//! - [`validation`] - Descriptor schema validation

// Core modules
pub mod error;
pub mod resolver;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    NestError,
    NestResult,
    PathError,
    PipelineError,
    PipelineResult,
};

// =============================================================================
// Re-exports - Resolver
// =============================================================================

pub use resolver::{resolve, resolve_str, DocPath, Resolution};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{validate_descriptor, validate_matrix};

// =============================================================================
// Re-exports - DSL
// =============================================================================

pub use transform::dsl::{
    transform,
    transform_with,
    transform_flat,
    Chain,
    ChainReport,
    DependencyList,
    DependencyMatrix,
    Descriptor,
    Hop,
    TransformOptions,
    TransformReport,
    UnmatchedPolicy,
    example_document,
    example_list_value,
    example_matrix,
    example_matrix_value,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    read_json,
    run,
    run_document,
    PipelineOptions,
};
