//! JSON export and import
//!
//! Export writes the bare array of annotations. Import accepts that array or a
//! versioned envelope `{"version": 1, "annotations": [...]}` and validates every
//! entry before anything is handed to the store.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotation::Annotation;
use crate::error::ValidationError;

/// Envelope version understood by [`parse_annotations`]
pub const EXPORT_SCHEMA_VERSION: u64 = 1;

/// Versioned wrapper accepted on import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub version: u64,
    pub annotations: Vec<Annotation>,
}

/// Pretty-printed JSON array of `annotations`; `selected` is never written
pub fn export_annotations(annotations: &[Annotation]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(annotations)
}

/// Parse and validate an export payload. Any bad entry rejects the whole payload.
pub fn parse_annotations(json: &str) -> Result<Vec<Annotation>, ValidationError> {
    let value: Value =
        serde_json::from_str(json).map_err(|error| ValidationError::Syntax(error.to_string()))?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut object) => {
            let version = object
                .get("version")
                .and_then(Value::as_u64)
                .ok_or(ValidationError::NotAnArray)?;
            if version != EXPORT_SCHEMA_VERSION {
                return Err(ValidationError::UnsupportedVersion(version));
            }
            match object.remove("annotations") {
                Some(Value::Array(entries)) => entries,
                _ => return Err(ValidationError::NotAnArray),
            }
        }
        _ => return Err(ValidationError::NotAnArray),
    };

    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let annotation: Annotation = serde_json::from_value(entry).map_err(|error| {
                ValidationError::Entry {
                    index,
                    message: error.to_string(),
                }
            })?;
            annotation
                .validate()
                .map_err(|source| ValidationError::InvalidEntry { index, source })?;
            if !seen.insert(annotation.id.clone()) {
                return Err(ValidationError::DuplicateId {
                    index,
                    id: annotation.id,
                });
            }
            Ok(annotation)
        })
        .collect()
}
