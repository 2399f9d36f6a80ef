//! Flat dependency lists
//!
//! A flat list is a single array of descriptors in any order. Each
//! descriptor is applied in place on the working copy, so intermediate
//! collections keep what was nested into them, and a descriptor reading
//! from a collection always runs after every descriptor writing into it.
//!
//! ```text
//! venues -> events        events gain `venue`
//! events -> performances  performances gain `event` (with its `venue`)
//! packages -> tickets     independent
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::executor::{check_document, collection, collection_mut, ChainReport, TransformOptions, TransformReport};
use super::index::{attach_all, IdIndex};
use super::matrix::{Descriptor, Hop};
use crate::error::{NestError, NestResult};
use crate::resolver::kind_of;

/// An unordered list of independent join hops.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct DependencyList {
    hops: Vec<Hop>,
}

impl DependencyList {
    /// Validate a raw JSON list of descriptors.
    ///
    /// Errors label descriptors as chain 0.
    pub fn from_value(value: &Value) -> NestResult<Self> {
        let raw = value.as_array().ok_or_else(|| {
            NestError::InvalidMatrix(format!("expected an array of descriptors, found {}", kind_of(value)))
        })?;

        let hops = raw
            .iter()
            .enumerate()
            .map(|(position, d)| {
                let descriptor = Descriptor::from_value(0, position, d)?;
                let Some(destination_path) = descriptor.destination_path else {
                    return Err(NestError::malformed(
                        0,
                        position,
                        "every descriptor of a dependency list must name its destinationPath",
                    ));
                };
                Ok(Hop {
                    source_path: descriptor.source_path,
                    source_id: descriptor.source_id,
                    destination_path,
                    destination_id: descriptor.destination_id,
                    key_name: descriptor.destination_key_name,
                })
            })
            .collect::<NestResult<Vec<_>>>()?;

        Ok(Self { hops })
    }

    /// Serialize to a JSON array of descriptors
    pub fn to_value(&self) -> Value {
        Value::Array(self.hops.iter().map(|hop| Descriptor::from(hop).to_value()).collect())
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Hops in execution order, each with its position in the list.
    ///
    /// A hop writing into collection `X` runs before every hop reading from
    /// `X`. Among hops that are ready at the same time, list order wins.
    /// A hop reading from and writing into the same collection does not
    /// depend on itself.
    pub fn ordered(&self) -> NestResult<Vec<(usize, &Hop)>> {
        let count = self.hops.len();
        let mut done = vec![false; count];
        let mut order = Vec::with_capacity(count);

        while order.len() < count {
            let ready = (0..count).find(|&i| !done[i] && self.predecessor(i, &done).is_none());
            match ready {
                Some(i) => {
                    done[i] = true;
                    order.push((i, &self.hops[i]));
                }
                None => return Err(NestError::CyclicDependencies(self.cycle(&done))),
            }
        }

        Ok(order)
    }

    /// Apply every hop in dependency order to a copy of `document`.
    pub fn apply(&self, document: &Value, options: &TransformOptions) -> NestResult<TransformReport> {
        check_document(document)?;
        let order = self.ordered()?;

        let mut working = document.clone();
        let mut reports = Vec::with_capacity(order.len());

        for (index, hop) in order {
            let entities = collection(&working, &hop.source_path, NestError::SourcePathNotFound)?;
            let dictionary = IdIndex::build(entities, &hop.source_id);

            let destination = collection_mut(&mut working, &hop.destination_path)?;
            let stats = attach_all(
                destination,
                hop.foreign_key(),
                &hop.key_name,
                &dictionary,
                options.unmatched,
            );
            debug!(
                hop = index,
                source = %hop.source_path,
                destination = %hop.destination_path,
                matched = stats.matched,
                unmatched = stats.unmatched,
                "applied hop"
            );

            let mut report = ChainReport::for_hop(index, hop, 1);
            report.duplicate_ids = dictionary.duplicates();
            report.absorb(stats);
            reports.push(report);
        }

        Ok(TransformReport {
            document: working,
            chains: reports,
        })
    }

    /// An unfinished hop that must run before hop `i`.
    fn predecessor(&self, i: usize, done: &[bool]) -> Option<usize> {
        let source = &self.hops[i].source_path;
        (0..self.hops.len()).find(|&j| j != i && !done[j] && self.hops[j].destination_path == *source)
    }

    /// Source paths along one cycle among the unfinished hops, first path repeated at the end.
    fn cycle(&self, done: &[bool]) -> Vec<String> {
        let mut visited: Vec<usize> = Vec::new();
        let mut current = (0..self.hops.len()).find(|&i| !done[i]);

        // Every unfinished hop has an unfinished predecessor, so the walk revisits.
        while let Some(i) = current {
            if let Some(start) = visited.iter().position(|&v| v == i) {
                let mut paths: Vec<String> = visited[start..]
                    .iter()
                    .rev()
                    .map(|&v| self.hops[v].source_path.to_string())
                    .collect();
                if let Some(first) = paths.first().cloned() {
                    paths.push(first);
                }
                return paths;
            }
            visited.push(i);
            current = self.predecessor(i, done);
        }

        visited.iter().map(|&v| self.hops[v].source_path.to_string()).collect()
    }
}

impl TryFrom<Value> for DependencyList {
    type Error = NestError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

impl From<DependencyList> for Value {
    fn from(list: DependencyList) -> Self {
        list.to_value()
    }
}

/// Apply a raw flat dependency list to a copy of `document`.
pub fn transform_flat(list: &Value, document: &Value) -> NestResult<Value> {
    if !list.is_array() {
        return Err(NestError::InvalidMatrix(format!(
            "expected an array of descriptors, found {}",
            kind_of(list)
        )));
    }
    check_document(document)?;

    let list = DependencyList::from_value(list)?;
    list.apply(document, &TransformOptions::default()).map(|report| report.document)
}

/// The demo flat list, deliberately not in dependency order.
pub fn example_list_value() -> Value {
    json!([
        {
            "sourcePath": "content.packages",
            "sourceId": "packageID",
            "destinationPath": "content.tickets",
            "destinationKeyName": "package"
        },
        {
            "sourcePath": "content.events",
            "sourceId": "eventID",
            "destinationPath": "content.performances",
            "destinationKeyName": "event"
        },
        {
            "sourcePath": "content.venues",
            "sourceId": "venueID",
            "destinationPath": "content.events",
            "destinationKeyName": "venue"
        }
    ])
}
