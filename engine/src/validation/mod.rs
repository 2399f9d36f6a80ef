//! JSON Schema validation for dependency descriptors.
//!
//! Descriptor shape (required fields, string types, well-formed dot paths)
//! is checked against an embedded Draft 7 schema before a descriptor is
//! converted into its typed form, so callers get one readable message per
//! problem instead of the first serde failure.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from the `schemas/` directory:
//! - `dependency-descriptor.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use nestor::validation::validate_descriptor;
//!
//! let descriptor = json!({
//!     "sourcePath": "content.venues",
//!     "sourceId": "venueID",
//!     "destinationPath": "content.events",
//!     "destinationKeyName": "venue"
//! });
//! assert!(validate_descriptor(&descriptor).is_ok());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::NestError;
use crate::resolver::kind_of;
use crate::transform::dsl::matrix::{Chain, DependencyMatrix, Descriptor};

static DESCRIPTOR_SCHEMA: Lazy<jsonschema::Validator> = Lazy::new(|| {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/dependency-descriptor.json"))
        .expect("Invalid embedded schema");
    jsonschema::draft7::new(&schema).expect("Invalid embedded schema")
});

/// Validate one raw descriptor object against the embedded schema.
pub fn validate_descriptor(data: &Value) -> Result<(), Vec<String>> {
    if !data.is_object() {
        return Err(vec![format!("expected a descriptor object, found {}", kind_of(data))]);
    }

    let errors: Vec<String> = DESCRIPTOR_SCHEMA
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a whole raw matrix, collecting every problem.
///
/// [`DependencyMatrix::from_value`] stops at the first error; this walks all
/// chains so a configuration can be fixed in one pass.
pub fn validate_matrix(value: &Value) -> Result<DependencyMatrix, Vec<NestError>> {
    let Some(raw_chains) = value.as_array() else {
        return Err(vec![NestError::InvalidMatrix(format!(
            "expected an array of chains, found {}",
            kind_of(value)
        ))]);
    };

    let mut errors = Vec::new();
    let mut chains = Vec::with_capacity(raw_chains.len());

    for (index, raw) in raw_chains.iter().enumerate() {
        let Some(raw) = raw.as_array() else {
            errors.push(NestError::ChainNotArray { index });
            continue;
        };

        let mut descriptors = Vec::with_capacity(raw.len());
        let mut well_formed = true;
        for (position, d) in raw.iter().enumerate() {
            match Descriptor::from_value(index, position, d) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => {
                    errors.push(e);
                    well_formed = false;
                }
            }
        }

        // Linking needs every descriptor of the chain.
        if well_formed {
            match Chain::new(index, descriptors) {
                Ok(chain) => chains.push(chain),
                Err(e) => errors.push(e),
            }
        }
    }

    if errors.is_empty() {
        Ok(DependencyMatrix::new(chains))
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::dsl::matrix::example_matrix_value;
    use serde_json::json;

    fn venue_descriptor() -> Value {
        json!({
            "sourcePath": "content.venues",
            "sourceId": "venueID",
            "destinationPath": "content.events",
            "destinationKeyName": "venue"
        })
    }

    #[test]
    fn test_valid_descriptor() {
        assert!(validate_descriptor(&venue_descriptor()).is_ok());
    }

    #[test]
    fn test_missing_required_fields() {
        let mut d = venue_descriptor();
        d.as_object_mut().unwrap().remove("sourceId");
        d.as_object_mut().unwrap().remove("destinationKeyName");
        let errors = validate_descriptor(&d).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("destinationKeyName")));
        assert!(errors.len() >= 2);
    }

    #[test]
    fn test_wrong_field_types() {
        let mut d = venue_descriptor();
        d["destinationKeyName"] = json!(123);
        assert!(validate_descriptor(&d).is_err());

        let mut d = venue_descriptor();
        d["sourcePath"] = json!("content.");
        assert!(validate_descriptor(&d).is_err());

        assert!(validate_descriptor(&json!("content.venues")).is_err());
    }

    #[test]
    fn test_conflicting_id_spellings() {
        let mut d = venue_descriptor();
        d["sourceID"] = json!("venueID");
        assert!(validate_descriptor(&d).is_err());
    }

    #[test]
    fn test_validate_matrix_collects_everything() {
        let mut raw = example_matrix_value();
        raw[0][1]["sourcePath"] = json!("content.performancess");
        raw[1][0]["destinationKeyName"] = json!(false);
        raw.as_array_mut().unwrap().push(json!("second.chain"));

        let errors = validate_matrix(&raw).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], NestError::InvalidChain { chain: 0, position: 1, .. }));
        assert!(matches!(errors[1], NestError::MalformedDescriptor { chain: 1, position: 0, .. }));
        assert_eq!(errors[2], NestError::ChainNotArray { index: 2 });
    }

    #[test]
    fn test_validate_matrix_ok() {
        let matrix = validate_matrix(&example_matrix_value()).unwrap();
        assert_eq!(matrix.chains().len(), 2);
    }
}
