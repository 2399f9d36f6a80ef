//! Dependency matrix definition
//!
//! A matrix is an ordered list of chains; a chain is an ordered list of
//! descriptors, each describing one foreign-key join hop.
//!
//! ```json
//! [
//!   [
//!     { "sourcePath": "content.venues", "sourceId": "venueID",
//!       "destinationPath": "content.events", "destinationKeyName": "venue" },
//!     { "sourcePath": "content.events", "sourceId": "eventID",
//!       "destinationPath": "content.performances", "destinationKeyName": "event" }
//!   ]
//! ]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{NestError, NestResult};
use crate::resolver::{kind_of, DocPath};
use crate::validation::validate_descriptor;

/// One join hop as written by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Collection whose entities get nested
    pub source_path: DocPath,

    /// Identifier field of the source entities
    #[serde(alias = "sourceID")]
    pub source_id: String,

    /// Collection receiving the nested entities. May be omitted on every
    /// descriptor but the last of a chain, where it is implied by the next
    /// descriptor's `sourcePath`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<DocPath>,

    /// Foreign-key field on the destination entities (defaults to `sourceId`)
    #[serde(default, alias = "destinationID", skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<String>,

    /// Property name the matched entity is stored under
    pub destination_key_name: String,
}

impl Descriptor {
    /// Create a descriptor whose foreign key has the same name as `source_id`.
    pub fn new(
        source_path: DocPath,
        source_id: &str,
        destination_path: DocPath,
        destination_key_name: &str,
    ) -> Self {
        Self {
            source_path,
            source_id: source_id.to_string(),
            destination_path: Some(destination_path),
            destination_id: None,
            destination_key_name: destination_key_name.to_string(),
        }
    }

    /// Set an explicit foreign-key field.
    pub fn with_destination_id(mut self, destination_id: &str) -> Self {
        self.destination_id = Some(destination_id.to_string());
        self
    }

    /// Field read off destination entities to find their match.
    pub fn foreign_key(&self) -> &str {
        self.destination_id.as_deref().unwrap_or(&self.source_id)
    }

    /// Check a raw JSON descriptor and convert it.
    ///
    /// `chain` and `position` only label the error.
    pub fn from_value(chain: usize, position: usize, value: &Value) -> NestResult<Self> {
        validate_descriptor(value).map_err(|errors| NestError::malformed(chain, position, errors.join("; ")))?;
        serde_json::from_value(value.clone()).map_err(|e| NestError::malformed(chain, position, e))
    }

    /// Serialize back to the camelCase JSON object form.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("sourcePath".to_string(), json!(self.source_path.to_string()));
        obj.insert("sourceId".to_string(), json!(self.source_id));
        if let Some(ref path) = self.destination_path {
            obj.insert("destinationPath".to_string(), json!(path.to_string()));
        }
        if let Some(ref id) = self.destination_id {
            obj.insert("destinationId".to_string(), json!(id));
        }
        obj.insert("destinationKeyName".to_string(), json!(self.destination_key_name));
        Value::Object(obj)
    }
}

/// A descriptor after chain validation: every path is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub source_path: DocPath,
    pub source_id: String,
    pub destination_path: DocPath,
    pub destination_id: Option<String>,
    pub key_name: String,
}

impl Hop {
    /// Field read off destination entities to find their match.
    pub fn foreign_key(&self) -> &str {
        self.destination_id.as_deref().unwrap_or(&self.source_id)
    }
}

impl From<&Hop> for Descriptor {
    fn from(hop: &Hop) -> Self {
        Self {
            source_path: hop.source_path.clone(),
            source_id: hop.source_id.clone(),
            destination_path: Some(hop.destination_path.clone()),
            destination_id: hop.destination_id.clone(),
            destination_key_name: hop.key_name.clone(),
        }
    }
}

/// An ordered, linked sequence of hops.
///
/// Every hop after the first reads from the collection the previous hop
/// writes into.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain {
    hops: Vec<Hop>,
}

impl Chain {
    /// Validate and link `descriptors`. `index` is the chain's position in
    /// its matrix and only labels errors.
    pub fn new(index: usize, descriptors: Vec<Descriptor>) -> NestResult<Self> {
        let mut hops: Vec<Hop> = Vec::with_capacity(descriptors.len());
        let mut iter = descriptors.into_iter().enumerate().peekable();

        while let Some((position, descriptor)) = iter.next() {
            let Descriptor {
                source_path,
                source_id,
                destination_path,
                destination_id,
                destination_key_name,
            } = descriptor;

            if let Some(previous) = hops.last() {
                if source_path != previous.destination_path {
                    return Err(NestError::InvalidChain {
                        chain: index,
                        position,
                        expected: previous.destination_path.to_string(),
                        found: source_path.to_string(),
                    });
                }
            }

            let destination_path = match destination_path {
                Some(path) => path,
                None => match iter.peek() {
                    Some((_, next)) => next.source_path.clone(),
                    None => {
                        return Err(NestError::malformed(
                            index,
                            position,
                            "the last descriptor of a chain must name its destinationPath",
                        ))
                    }
                },
            };

            hops.push(Hop {
                source_path,
                source_id,
                destination_path,
                destination_id,
                key_name: destination_key_name,
            });
        }

        Ok(Self { hops })
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// The last hop, whose destination receives the nested result.
    pub fn terminal(&self) -> Option<&Hop> {
        self.hops.last()
    }

    /// The chain as plain descriptors (implied paths made explicit).
    pub fn descriptors(&self) -> Vec<Descriptor> {
        self.hops.iter().map(Descriptor::from).collect()
    }
}

/// An ordered collection of independent chains.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct DependencyMatrix {
    chains: Vec<Chain>,
}

impl DependencyMatrix {
    pub fn new(chains: Vec<Chain>) -> Self {
        Self { chains }
    }

    /// Validate a raw JSON matrix (array of arrays of descriptors).
    ///
    /// Every chain is checked to be an array before any descriptor is
    /// looked at, so a non-array chain is reported even when an earlier
    /// chain also has a malformed descriptor.
    pub fn from_value(value: &Value) -> NestResult<Self> {
        let raw_chains = value.as_array().ok_or_else(|| {
            NestError::InvalidMatrix(format!("expected an array of chains, found {}", kind_of(value)))
        })?;

        let raw_chains = raw_chains
            .iter()
            .enumerate()
            .map(|(index, chain)| chain.as_array().ok_or(NestError::ChainNotArray { index }))
            .collect::<NestResult<Vec<_>>>()?;

        let chains = raw_chains
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let descriptors = raw
                    .iter()
                    .enumerate()
                    .map(|(position, d)| Descriptor::from_value(index, position, d))
                    .collect::<NestResult<Vec<_>>>()?;
                Chain::new(index, descriptors)
            })
            .collect::<NestResult<Vec<_>>>()?;

        Ok(Self { chains })
    }

    /// Parse a matrix from a JSON string
    pub fn from_json(json: &str) -> NestResult<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| NestError::InvalidMatrix(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Serialize to the array-of-arrays JSON form
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.chains
                .iter()
                .map(|chain| Value::Array(chain.descriptors().iter().map(Descriptor::to_value).collect()))
                .collect(),
        )
    }

    /// Serialize to a pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_value())
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Every source and destination path the matrix touches, deduplicated.
    pub fn referenced_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .chains
            .iter()
            .flat_map(|chain| chain.hops())
            .flat_map(|hop| [hop.source_path.to_string(), hop.destination_path.to_string()])
            .collect();

        paths.sort();
        paths.dedup();
        paths
    }
}

impl TryFrom<Value> for DependencyMatrix {
    type Error = NestError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

impl From<DependencyMatrix> for Value {
    fn from(matrix: DependencyMatrix) -> Self {
        matrix.to_value()
    }
}

/// The demo document: performances reference events, events reference
/// venues, tickets reference packages.
pub fn example_document() -> Value {
    json!({
        "content": {
            "performances": [
                { "performanceID": 1, "eventID": "a" },
                { "performanceID": 2, "eventID": "a" }
            ],
            "events": [{ "eventID": "a", "venueID": "b" }],
            "venues": [{ "venueID": "b" }],
            "tickets": [{ "ticketID": 1, "packageID": "d" }],
            "packages": [{ "packageID": "d" }]
        }
    })
}

/// Raw JSON for the matrix matching [`example_document`].
pub fn example_matrix_value() -> Value {
    json!([
        [
            {
                "sourcePath": "content.venues",
                "sourceId": "venueID",
                "destinationPath": "content.events",
                "destinationId": "venueID",
                "destinationKeyName": "venue"
            },
            {
                "sourcePath": "content.events",
                "sourceId": "eventID",
                "destinationPath": "content.performances",
                "destinationId": "eventID",
                "destinationKeyName": "event"
            }
        ],
        [
            {
                "sourcePath": "content.packages",
                "sourceId": "packageID",
                "destinationPath": "content.tickets",
                "destinationKeyName": "package"
            }
        ]
    ])
}

/// Typed version of [`example_matrix_value`].
pub fn example_matrix() -> DependencyMatrix {
    DependencyMatrix::from_value(&example_matrix_value()).expect("Invalid embedded example matrix")
}
