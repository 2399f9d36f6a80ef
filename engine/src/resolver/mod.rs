//! Path resolution over JSON documents.
//!
//! Collections are addressed with dot-separated paths such as
//! `content.events`. A path is parsed once into a [`DocPath`] and then walked
//! segment by segment:
//!
//! - objects are indexed by key
//! - arrays are indexed by a canonical decimal segment (`0`, `12`, never `+1` or `01`)
//! - anything else ends the walk with [`Resolution::Absent`]
//!
//! Resolution never fails: an absent value is a normal outcome, distinct
//! from a value that exists but is empty.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::PathError;

/// A validated, dot-separated path into a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    /// Parse a dot-separated path. Empty paths and empty segments are rejected.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = path.split('.').map(String::from).collect();
        if let Some(position) = segments.iter().position(|s| s.is_empty()) {
            return Err(PathError::EmptySegment {
                path: path.to_string(),
                position,
            });
        }

        Ok(Self { segments })
    }

    /// The individual segments, in walk order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a parsed path; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for DocPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocPath> for String {
    fn from(path: DocPath) -> Self {
        path.to_string()
    }
}

/// Outcome of resolving a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// The path exists and addresses this value.
    Found(&'a Value),
    /// Some segment along the path does not exist.
    Absent,
}

impl<'a> Resolution<'a> {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    /// Convert into an `Option`, dropping the distinction's name.
    pub fn found(self) -> Option<&'a Value> {
        match self {
            Resolution::Found(value) => Some(value),
            Resolution::Absent => None,
        }
    }
}

/// Resolve `path` against `document`.
pub fn resolve<'a>(document: &'a Value, path: &DocPath) -> Resolution<'a> {
    let mut current = document;
    for segment in path.segments() {
        match step(current, segment) {
            Some(next) => current = next,
            None => return Resolution::Absent,
        }
    }
    Resolution::Found(current)
}

/// Resolve `path` against `document` for in-place modification.
pub fn resolve_mut<'a>(document: &'a mut Value, path: &DocPath) -> Option<&'a mut Value> {
    let mut current = document;
    for segment in path.segments() {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(array_index(segment)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Parse `path` and resolve it in one go.
pub fn resolve_str<'a>(document: &'a Value, path: &str) -> Result<Resolution<'a>, PathError> {
    let path = DocPath::parse(path)?;
    Ok(resolve(document, &path))
}

fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(array_index(segment)?),
        _ => None,
    }
}

/// Canonical decimal index: digits only, no sign, no leading zero.
fn array_index(segment: &str) -> Option<usize> {
    let canonical = segment.bytes().all(|b| b.is_ascii_digit()) && (segment == "0" || !segment.starts_with('0'));
    if canonical {
        segment.parse().ok()
    } else {
        None
    }
}

/// Short name of a JSON value's kind, for error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> DocPath {
        DocPath::parse(s).unwrap()
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert_eq!(DocPath::parse(""), Err(PathError::Empty));
        assert!(matches!(
            DocPath::parse("content..events"),
            Err(PathError::EmptySegment { position: 1, .. })
        ));
        assert!(DocPath::parse(".events").is_err());
        assert!(DocPath::parse("events.").is_err());
        assert_eq!(path("content.events").segments(), ["content", "events"]);
    }

    #[test]
    fn test_display_round_trips() {
        assert_eq!(path("a.b.c").to_string(), "a.b.c");
        let parsed: DocPath = serde_json::from_value(json!("x.y")).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), json!("x.y"));
    }

    #[test]
    fn test_resolve_nested_collection() {
        let doc = json!({ "content": { "events": [{ "eventID": "a" }] } });
        let found = resolve(&doc, &path("content.events"));
        assert_eq!(found, Resolution::Found(&json!([{ "eventID": "a" }])));
    }

    #[test]
    fn test_absent_is_not_empty() {
        let doc = json!({ "content": { "events": [] } });
        assert_eq!(resolve(&doc, &path("content.events")).found(), Some(&json!([])));
        assert_eq!(resolve(&doc, &path("content.venues")), Resolution::Absent);
        assert_eq!(resolve(&doc, &path("content.events.x")), Resolution::Absent);
    }

    #[test]
    fn test_null_and_scalars_are_not_indexable() {
        let doc = json!({ "a": null, "b": 3, "c": "text" });
        assert_eq!(resolve(&doc, &path("a.x")), Resolution::Absent);
        assert_eq!(resolve(&doc, &path("b.x")), Resolution::Absent);
        assert_eq!(resolve(&doc, &path("c.0")), Resolution::Absent);
        assert_eq!(resolve(&doc, &path("a")), Resolution::Found(&Value::Null));
    }

    #[test]
    fn test_array_index_segments() {
        let doc = json!({ "pages": [{ "items": [1, 2] }, { "items": [3] }] });
        assert_eq!(resolve(&doc, &path("pages.1.items")).found(), Some(&json!([3])));
        assert_eq!(resolve(&doc, &path("pages.2.items")), Resolution::Absent);
        assert_eq!(resolve(&doc, &path("pages.first")), Resolution::Absent);
    }

    #[test]
    fn test_only_canonical_indexes() {
        let mut doc = json!({ "pages": ["zero", "one"] });
        assert_eq!(resolve(&doc, &path("pages.0")).found(), Some(&json!("zero")));
        for segment in ["+1", "01", "00", "-1", "1.0", " 1"] {
            let p = path(&format!("pages.{}", segment));
            assert_eq!(resolve(&doc, &p), Resolution::Absent, "segment {:?}", segment);
            assert!(resolve_mut(&mut doc, &p).is_none());
        }
    }

    #[test]
    fn test_resolve_mut_edits_in_place() {
        let mut doc = json!({ "content": { "tickets": [{ "ticketID": 1 }] } });
        let tickets = resolve_mut(&mut doc, &path("content.tickets")).unwrap();
        tickets.as_array_mut().unwrap().push(json!({ "ticketID": 2 }));
        assert_eq!(doc["content"]["tickets"][1]["ticketID"], 2);
        assert!(resolve_mut(&mut doc, &path("content.missing")).is_none());
    }

    #[test]
    fn test_resolve_str() {
        let doc = json!({ "venues": [] });
        assert!(resolve_str(&doc, "venues").unwrap().is_found());
        assert!(resolve_str(&doc, "").is_err());
    }
}
