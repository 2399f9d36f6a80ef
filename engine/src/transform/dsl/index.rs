//! Identifier dictionaries and the per-entity join step.
//!
//! Each hop indexes its source collection by the hop's identifier field. The
//! dictionary holds deep copies, so enriching an indexed entity never
//! touches the collection it came from.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Largest magnitude below which every integral `f64` is exact.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Dictionary key for an identifier value.
///
/// Keys compare by canonical JSON text: `"1"` and `1` are different keys.
/// Numbers compare by value, so `1.0` and `1` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdKey(String);

impl IdKey {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Number(n) if n.is_f64() => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => IdKey((f as i64).to_string()),
                _ => IdKey(value.to_string()),
            },
            _ => IdKey(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What to write when a foreign key has no match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Leave the property absent, removing any existing value under that name
    #[default]
    Omit,
    /// Set the property to `null`
    Null,
}

/// Outcome of attaching into one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attached {
    Matched,
    Unmatched,
    /// The entry is not an object, so nothing can be attached to it
    Skipped,
}

/// Counters for a run of [`attach`] calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttachStats {
    pub matched: usize,
    pub unmatched: usize,
    pub skipped: usize,
}

impl AttachStats {
    pub fn record(&mut self, outcome: Attached) {
        match outcome {
            Attached::Matched => self.matched += 1,
            Attached::Unmatched => self.unmatched += 1,
            Attached::Skipped => self.skipped += 1,
        }
    }
}

/// Identifier value -> entity copy, for one hop.
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    entries: HashMap<IdKey, Value>,
    duplicates: usize,
    skipped: usize,
}

impl IdIndex {
    /// Index `entities` by `id_field`.
    ///
    /// Later entities overwrite earlier ones with the same identifier.
    /// Non-object entries and objects without the field are left out.
    pub fn build(entities: &[Value], id_field: &str) -> Self {
        let mut index = Self::default();

        for entity in entities {
            let Some(id) = entity.as_object().and_then(|obj| obj.get(id_field)) else {
                index.skipped += 1;
                continue;
            };
            if index.entries.insert(IdKey::of(id), entity.clone()).is_some() {
                index.duplicates += 1;
            }
        }

        index
    }

    /// Look up the entity whose identifier equals `id`.
    pub fn get(&self, id: &Value) -> Option<&Value> {
        self.entries.get(&IdKey::of(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers that were seen more than once.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Entries that could not be indexed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Nest entities of `previous` into every indexed entity.
    pub fn enrich(
        &mut self,
        foreign_key: &str,
        key_name: &str,
        previous: &IdIndex,
        policy: UnmatchedPolicy,
    ) -> AttachStats {
        let mut stats = AttachStats::default();
        for entity in self.entries.values_mut() {
            stats.record(attach(entity, foreign_key, key_name, previous, policy));
        }
        stats
    }
}

/// Attach the entity matching `entity[foreign_key]` under `key_name`.
pub fn attach(
    entity: &mut Value,
    foreign_key: &str,
    key_name: &str,
    index: &IdIndex,
    policy: UnmatchedPolicy,
) -> Attached {
    let Some(obj) = entity.as_object_mut() else {
        return Attached::Skipped;
    };

    let matched = obj.get(foreign_key).and_then(|fk| index.get(fk)).cloned();
    match (matched, policy) {
        (Some(found), _) => {
            obj.insert(key_name.to_string(), found);
            Attached::Matched
        }
        (None, UnmatchedPolicy::Omit) => {
            obj.remove(key_name);
            Attached::Unmatched
        }
        (None, UnmatchedPolicy::Null) => {
            obj.insert(key_name.to_string(), Value::Null);
            Attached::Unmatched
        }
    }
}

/// Attach into every entity of a collection, in sequence order.
pub fn attach_all(
    entities: &mut [Value],
    foreign_key: &str,
    key_name: &str,
    index: &IdIndex,
    policy: UnmatchedPolicy,
) -> AttachStats {
    let mut stats = AttachStats::default();
    for entity in entities.iter_mut() {
        stats.record(attach(entity, foreign_key, key_name, index, policy));
    }
    stats
}
