//! Chain executor
//!
//! Applies a dependency matrix to a document and returns a new, nested
//! document. The input is never modified.
//!
//! For each chain, hop by hop:
//!
//! 1. index the collection at `sourcePath` by `sourceId`
//! 2. nest the previous hop's dictionary into the new one
//! 3. after the last hop, attach into the destination collection
//!
//! Only the final destination collection of a chain is modified in the
//! output; intermediate collections keep their original shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use super::index::{attach_all, AttachStats, IdIndex, UnmatchedPolicy};
use super::matrix::{Chain, DependencyMatrix, Hop};
use crate::error::{NestError, NestResult};
use crate::resolver::{kind_of, resolve, resolve_mut, DocPath, Resolution};

/// Options for a transform run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformOptions {
    /// Behavior for foreign keys without a match
    pub unmatched: UnmatchedPolicy,
}

/// What one chain (or flat-list hop) did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReport {
    /// Position in the matrix or dependency list
    pub index: usize,
    /// Collection that received the nested entities
    pub destination: Option<String>,
    /// Property the entities were stored under
    pub key_name: Option<String>,
    /// Number of hops in the chain
    pub hops: usize,
    /// Destination entities that got a match
    pub enriched: usize,
    /// Destination entities whose foreign key had no match
    pub unmatched: usize,
    /// Destination entries that are not objects
    pub skipped: usize,
    /// Identifiers seen more than once while indexing
    pub duplicate_ids: usize,
}

impl ChainReport {
    pub(crate) fn for_hop(index: usize, hop: &Hop, hops: usize) -> Self {
        Self {
            index,
            destination: Some(hop.destination_path.to_string()),
            key_name: Some(hop.key_name.clone()),
            hops,
            ..Self::default()
        }
    }

    pub(crate) fn absorb(&mut self, stats: AttachStats) {
        self.enriched += stats.matched;
        self.unmatched += stats.unmatched;
        self.skipped += stats.skipped;
    }
}

/// Result of a transform run
#[derive(Debug, Clone)]
pub struct TransformReport {
    /// The nested copy of the input document
    pub document: Value,
    /// One entry per chain, in execution order
    pub chains: Vec<ChainReport>,
}

impl TransformReport {
    /// Total destination entities that received a nested entity.
    pub fn enriched(&self) -> usize {
        self.chains.iter().map(|c| c.enriched).sum()
    }

    /// Total foreign keys without a match.
    pub fn unmatched(&self) -> usize {
        self.chains.iter().map(|c| c.unmatched).sum()
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "Applied {} chains: {} entities enriched, {} unmatched",
            self.chains.len(),
            self.enriched(),
            self.unmatched()
        )
    }
}

/// Nest referenced entities into a copy of `document`.
///
/// `matrix` is the raw JSON matrix: an array of chains, each an array of
/// descriptor objects. The shape of both arguments and every chain is
/// checked before any join work starts.
///
/// # Example
///
/// ```rust,ignore
/// use nestor::transform;
/// use serde_json::json;
///
/// let document = json!({ "content": {
///     "venues": [{ "venueID": "b" }],
///     "events": [{ "eventID": "a", "venueID": "b" }]
/// }});
/// let matrix = json!([[{
///     "sourcePath": "content.venues", "sourceId": "venueID",
///     "destinationPath": "content.events", "destinationKeyName": "venue"
/// }]]);
///
/// let nested = transform(&matrix, &document)?;
/// assert_eq!(nested["content"]["events"][0]["venue"]["venueID"], "b");
/// ```
pub fn transform(matrix: &Value, document: &Value) -> NestResult<Value> {
    if !matrix.is_array() {
        return Err(NestError::InvalidMatrix(format!(
            "expected an array of chains, found {}",
            kind_of(matrix)
        )));
    }
    check_document(document)?;

    let matrix = DependencyMatrix::from_value(matrix)?;
    transform_with(&matrix, document, &TransformOptions::default()).map(|report| report.document)
}

/// Apply an already validated matrix, returning the document and per-chain stats.
pub fn transform_with(
    matrix: &DependencyMatrix,
    document: &Value,
    options: &TransformOptions,
) -> NestResult<TransformReport> {
    check_document(document)?;

    let mut working = document.clone();
    let chains = matrix
        .chains()
        .iter()
        .enumerate()
        .map(|(index, chain)| apply_chain(index, chain, &mut working, options))
        .collect::<NestResult<Vec<_>>>()?;

    Ok(TransformReport {
        document: working,
        chains,
    })
}

impl DependencyMatrix {
    /// Nest referenced entities into a copy of `document` using default options.
    pub fn apply(&self, document: &Value) -> NestResult<Value> {
        transform_with(self, document, &TransformOptions::default()).map(|report| report.document)
    }
}

fn apply_chain(
    index: usize,
    chain: &Chain,
    document: &mut Value,
    options: &TransformOptions,
) -> NestResult<ChainReport> {
    let Some(terminal) = chain.terminal() else {
        debug!(chain = index, "empty chain, nothing to do");
        return Ok(ChainReport {
            index,
            ..ChainReport::default()
        });
    };

    debug!(chain = index, hops = chain.len(), destination = %terminal.destination_path, "applying chain");
    let mut report = ChainReport::for_hop(index, terminal, chain.len());
    let mut carried: Option<(&Hop, IdIndex)> = None;

    for hop in chain.hops() {
        let entities = collection(document, &hop.source_path, NestError::SourcePathNotFound)?;
        let mut dictionary = IdIndex::build(entities, &hop.source_id);
        report.duplicate_ids += dictionary.duplicates();

        if let Some((previous, previous_dictionary)) = carried.take() {
            let stats = dictionary.enrich(
                previous.foreign_key(),
                &previous.key_name,
                &previous_dictionary,
                options.unmatched,
            );
            trace!(
                chain = index,
                source = %hop.source_path,
                key = %previous.key_name,
                matched = stats.matched,
                unmatched = stats.unmatched,
                "nested previous hop"
            );
        }

        carried = Some((hop, dictionary));
    }

    if let Some((last, dictionary)) = carried {
        let destination = collection_mut(document, &last.destination_path)?;
        let stats = attach_all(
            destination,
            last.foreign_key(),
            &last.key_name,
            &dictionary,
            options.unmatched,
        );
        if stats.unmatched > 0 {
            debug!(
                chain = index,
                destination = %last.destination_path,
                unmatched = stats.unmatched,
                "foreign keys without a match"
            );
        }
        report.absorb(stats);
    }

    Ok(report)
}

/// Reject anything but a keyed mapping as a document.
pub(crate) fn check_document(document: &Value) -> NestResult<()> {
    match document {
        Value::Object(_) => Ok(()),
        Value::Null => Err(NestError::InvalidDocument("missing document".to_string())),
        other => Err(NestError::InvalidDocument(format!(
            "expected an object, found {}",
            kind_of(other)
        ))),
    }
}

/// The entities at `path`; `missing` builds the error for an absent path.
pub(crate) fn collection<'a>(
    document: &'a Value,
    path: &DocPath,
    missing: fn(String) -> NestError,
) -> NestResult<&'a [Value]> {
    match resolve(document, path) {
        Resolution::Found(Value::Array(items)) => Ok(items.as_slice()),
        Resolution::Found(other) => Err(NestError::CollectionExpected {
            path: path.to_string(),
            found: kind_of(other),
        }),
        Resolution::Absent => Err(missing(path.to_string())),
    }
}

/// The destination entities at `path`, for in-place enrichment.
pub(crate) fn collection_mut<'a>(document: &'a mut Value, path: &DocPath) -> NestResult<&'a mut [Value]> {
    match resolve_mut(document, path) {
        Some(Value::Array(items)) => Ok(items.as_mut_slice()),
        Some(other) => Err(NestError::CollectionExpected {
            path: path.to_string(),
            found: kind_of(other),
        }),
        None => Err(NestError::DestinationPathNotFound(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::dsl::matrix::{example_document, example_matrix, example_matrix_value};
    use serde_json::json;

    #[test]
    fn test_two_hop_chain() {
        let result = transform(&example_matrix_value(), &example_document()).unwrap();
        let performance = &result["content"]["performances"][0];
        assert_eq!(performance["event"]["eventID"], "a");
        assert_eq!(performance["event"]["venue"]["venueID"], "b");
        assert_eq!(result["content"]["tickets"][0]["package"]["packageID"], "d");
    }

    #[test]
    fn test_intermediate_collections_untouched() {
        let result = transform(&example_matrix_value(), &example_document()).unwrap();
        assert_eq!(result["content"]["events"], json!([{ "eventID": "a", "venueID": "b" }]));
        assert_eq!(result["content"]["venues"], json!([{ "venueID": "b" }]));
    }

    #[test]
    fn test_input_not_mutated() {
        let document = example_document();
        let before = document.clone();
        let _ = transform(&example_matrix_value(), &document).unwrap();
        assert_eq!(document, before);
    }

    #[test]
    fn test_document_shape_checked_first() {
        let err = transform(&example_matrix_value(), &json!([])).unwrap_err();
        assert!(matches!(err, NestError::InvalidDocument(_)));

        let err = transform(&example_matrix_value(), &Value::Null).unwrap_err();
        assert!(matches!(err, NestError::InvalidDocument(_)));

        let err = transform(&json!("dependencies"), &json!("response")).unwrap_err();
        assert!(matches!(err, NestError::InvalidMatrix(_)));

        // Document problems win over chain problems.
        let err = transform(&json!(["second.chain"]), &json!("response")).unwrap_err();
        assert!(matches!(err, NestError::InvalidDocument(_)));
    }

    #[test]
    fn test_empty_chain_and_empty_matrix() {
        let document = example_document();
        assert_eq!(transform(&json!([]), &document).unwrap(), document);
        assert_eq!(transform(&json!([[]]), &document).unwrap(), document);
    }

    #[test]
    fn test_destination_must_be_collection() {
        let document = json!({ "venues": [{ "id": 1 }], "settings": { "venue": 1 } });
        let matrix = json!([[{
            "sourcePath": "venues",
            "sourceId": "id",
            "destinationPath": "settings",
            "destinationKeyName": "venue"
        }]]);
        let err = transform(&matrix, &document).unwrap_err();
        assert_eq!(
            err,
            NestError::CollectionExpected { path: "settings".into(), found: "object" }
        );
    }

    #[test]
    fn test_report_counts() {
        let mut document = example_document();
        document["content"]["tickets"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "ticketID": 2, "packageID": "missing" }));

        let options = TransformOptions { unmatched: UnmatchedPolicy::Null };
        let report = transform_with(&example_matrix(), &document, &options).unwrap();

        assert_eq!(report.chains.len(), 2);
        assert_eq!(report.chains[0].enriched, 2);
        assert_eq!(report.chains[0].hops, 2);
        assert_eq!(report.chains[1].unmatched, 1);
        assert_eq!(report.document["content"]["tickets"][1]["package"], Value::Null);
        assert_eq!(report.summary(), "Applied 2 chains: 3 entities enriched, 1 unmatched");
    }

    #[test]
    fn test_apply_typed_matrix() {
        let nested = example_matrix().apply(&example_document()).unwrap();
        assert_eq!(nested["content"]["performances"][1]["event"]["venue"]["venueID"], "b");
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: TransformOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options.unmatched, UnmatchedPolicy::Omit);
        let options: TransformOptions = serde_json::from_value(json!({ "unmatched": "null" })).unwrap();
        assert_eq!(options.unmatched, UnmatchedPolicy::Null);
    }
}
