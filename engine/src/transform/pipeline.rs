//! File-level pipeline: read a document and a matrix file, nest, report.
//!
//! # Example
//!
//! ```rust,ignore
//! use nestor::transform::pipeline::{run, PipelineOptions};
//! use std::path::Path;
//!
//! let report = run(Path::new("response.json"), Path::new("matrix.json"), &PipelineOptions::default())?;
//! println!("{}", report.summary());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::dsl::{transform_with, DependencyList, DependencyMatrix, TransformOptions, TransformReport};
use crate::error::PipelineResult;

/// Options for a pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineOptions {
    /// Treat the matrix file as a flat dependency list
    pub flat: bool,

    /// Engine options
    pub transform: TransformOptions,
}

/// Read a JSON file.
pub fn read_json(path: &Path) -> PipelineResult<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Nest the document stored at `document_path` with the matrix at `matrix_path`.
pub fn run(document_path: &Path, matrix_path: &Path, options: &PipelineOptions) -> PipelineResult<TransformReport> {
    info!(document = %document_path.display(), "reading document");
    let document = read_json(document_path)?;
    info!(matrix = %matrix_path.display(), flat = options.flat, "reading matrix");
    let raw = read_json(matrix_path)?;
    run_document(&document, &raw, options)
}

/// Nest an in-memory document with a raw matrix (or flat list with `options.flat`).
pub fn run_document(document: &Value, matrix: &Value, options: &PipelineOptions) -> PipelineResult<TransformReport> {
    let report = if options.flat {
        DependencyList::from_value(matrix)?.apply(document, &options.transform)?
    } else {
        transform_with(&DependencyMatrix::from_value(matrix)?, document, &options.transform)?
    };

    for chain in &report.chains {
        info!(
            chain = chain.index,
            destination = chain.destination.as_deref().unwrap_or("-"),
            key = chain.key_name.as_deref().unwrap_or("-"),
            enriched = chain.enriched,
            unmatched = chain.unmatched,
            "chain applied"
        );
        if chain.duplicate_ids > 0 {
            warn!(chain = chain.index, duplicates = chain.duplicate_ids, "duplicate identifiers, last one wins");
        }
    }
    info!("{}", report.summary());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NestError, PipelineError};
    use crate::transform::dsl::{example_document, example_list_value, example_matrix};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_run_with_matrix_file() {
        let dir = tempdir().unwrap();
        let document = write_json(dir.path(), "doc.json", &example_document());
        let matrix = write_json(dir.path(), "matrix.json", &example_matrix().to_value());

        let report = run(&document, &matrix, &PipelineOptions::default()).unwrap();
        assert_eq!(report.document["content"]["performances"][0]["event"]["venue"]["venueID"], "b");
        assert_eq!(report.chains.len(), 2);
    }

    #[test]
    fn test_run_with_flat_list() {
        let options = PipelineOptions {
            flat: true,
            ..PipelineOptions::default()
        };
        let report = run_document(&example_document(), &example_list_value(), &options).unwrap();
        assert_eq!(report.chains.len(), 3);
        assert_eq!(report.document["content"]["events"][0]["venue"]["venueID"], "b");
    }

    #[test]
    fn test_engine_errors_propagate() {
        let mut raw = example_matrix().to_value();
        raw[0][0]["sourcePath"] = serde_json::json!("content.venuis");

        match run_document(&example_document(), &raw, &PipelineOptions::default()) {
            Err(PipelineError::Nest(NestError::SourcePathNotFound(path))) => {
                assert_eq!(path, "content.venuis")
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.chains)),
        }
    }

    #[test]
    fn test_bad_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_json(&path), Err(PipelineError::Json(_))));
        assert!(matches!(
            read_json(&dir.path().join("missing.json")),
            Err(PipelineError::Io(_))
        ));
    }

    #[test]
    fn test_options_from_json() {
        let options: PipelineOptions =
            serde_json::from_str(r#"{ "flat": true, "transform": { "unmatched": "null" } }"#).unwrap();
        assert!(options.flat);
        assert_eq!(options.transform.unmatched, crate::transform::dsl::UnmatchedPolicy::Null);

        let options: PipelineOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.flat);
    }
}
