//! Error types for the nesting engine.
//!
//! This module defines one error enum per concern:
//!
//! - [`PathError`] - Malformed dot-separated paths
//! - [`NestError`] - Matrix validation and join failures
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Path Errors
// =============================================================================

/// Errors while parsing a dot-separated document path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string is empty.
    #[error("Path must not be empty")]
    Empty,

    /// One of the segments between dots is empty.
    #[error("Path '{path}' has an empty segment at position {position}")]
    EmptySegment { path: String, position: usize },
}

// =============================================================================
// Nesting Errors
// =============================================================================

/// Errors raised by the chain join engine.
///
/// Every variant is terminal for the current transform call. No partially
/// nested document is ever returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NestError {
    /// The dependency matrix is missing or is not an array of chains.
    #[error("The first parameter is missing or it is not an array: {0}")]
    InvalidMatrix(String),

    /// An element of the matrix is not itself an array.
    #[error("The dependency chain ({index}) is not an array")]
    ChainNotArray { index: usize },

    /// The document is missing, is an array, or is not a keyed mapping.
    #[error("The second parameter is missing or it is not an object: {0}")]
    InvalidDocument(String),

    /// A descriptor's source path does not exist in the document.
    #[error("The source path {0} does not exist.")]
    SourcePathNotFound(String),

    /// A chain's final destination path does not exist in the document.
    #[error("The destination path {0} does not exist.")]
    DestinationPathNotFound(String),

    /// Adjacent descriptors are not linked source-to-destination.
    #[error(
        "The dependency chain is not valid. Chain {chain}, descriptor {position}: \
         expected sourcePath '{expected}', found '{found}'"
    )]
    InvalidChain {
        chain: usize,
        position: usize,
        expected: String,
        found: String,
    },

    /// A descriptor is missing a required field or has a field of the wrong shape.
    #[error("Malformed descriptor {position} in chain {chain}: {message}")]
    MalformedDescriptor {
        chain: usize,
        position: usize,
        message: String,
    },

    /// A path resolved, but not to an array of entities.
    #[error("The path {path} does not address a collection (found {found})")]
    CollectionExpected { path: String, found: &'static str },

    /// The flat dependency list cannot be ordered.
    #[error("The dependency list contains a cycle through: {}", .0.join(" -> "))]
    CyclicDependencies(Vec<String>),
}

impl NestError {
    /// Build a [`NestError::MalformedDescriptor`] from anything printable.
    pub fn malformed(chain: usize, position: usize, message: impl ToString) -> Self {
        NestError::MalformedDescriptor {
            chain,
            position,
            message: message.to_string(),
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors for file-based runs.
///
/// This is the error type returned by [`crate::transform::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading an input file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An input file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The engine rejected the matrix or document.
    #[error("Transform error: {0}")]
    Nest(#[from] NestError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for engine operations.
pub type NestResult<T> = Result<T, NestError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = NestError::SourcePathNotFound("content.venuis".into());
        assert_eq!(err.to_string(), "The source path content.venuis does not exist.");

        let err = NestError::ChainNotArray { index: 1 };
        assert_eq!(err.to_string(), "The dependency chain (1) is not an array");

        let err = NestError::CyclicDependencies(vec!["a".into(), "b".into(), "a".into()]);
        assert!(err.to_string().ends_with("a -> b -> a"));
    }

    #[test]
    fn test_error_conversion_chain() {
        let nest_err = NestError::DestinationPathNotFound("content.performancess".into());
        let pipeline_err: PipelineError = nest_err.into();
        assert!(pipeline_err.to_string().contains("content.performancess"));

        let json_err = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        let pipeline_err: PipelineError = json_err.into();
        assert!(pipeline_err.to_string().starts_with("JSON error"));
    }
}
