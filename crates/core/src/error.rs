//! Error types for the annotation engine

use thiserror::Error;

use crate::annotation::{AnnotationId, AnnotationType, InvalidAnnotation};

/// Malformed import payload. Rejected wholesale; the store is left untouched.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("payload is not valid JSON: {0}")]
    Syntax(String),

    #[error("expected a JSON array of annotations or a versioned envelope")]
    NotAnArray,

    #[error("unsupported export version {0}")]
    UnsupportedVersion(u64),

    #[error("entry {index}: {message}")]
    Entry { index: usize, message: String },

    #[error("entry {index}: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: InvalidAnnotation,
    },

    #[error("entry {index}: duplicate id `{id}`")]
    DuplicateId { index: usize, id: AnnotationId },
}

impl ValidationError {
    /// Index of the offending entry, when the failure is tied to one
    pub fn entry_index(&self) -> Option<usize> {
        match self {
            ValidationError::Entry { index, .. }
            | ValidationError::InvalidEntry { index, .. }
            | ValidationError::DuplicateId { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Errors produced by store and session operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid annotation: {0}")]
    Invalid(#[from] InvalidAnnotation),

    #[error("annotation `{0}` not found")]
    NotFound(AnnotationId),

    #[error("{0} annotation has degenerate geometry")]
    DegenerateGeometry(AnnotationType),

    #[error("annotation id `{0}` already exists")]
    DuplicateId(AnnotationId),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Failures that callers treat as silent no-ops
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            EngineError::NotFound(_)
                | EngineError::DegenerateGeometry(_)
                | EngineError::DuplicateId(_)
        )
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_index() {
        let error = ValidationError::InvalidEntry {
            index: 3,
            source: InvalidAnnotation::PageNumber,
        };
        assert_eq!(error.entry_index(), Some(3));
        assert_eq!(error.to_string(), "entry 3: page number must be >= 1");
        assert_eq!(ValidationError::NotAnArray.entry_index(), None);
    }

    #[test]
    fn test_benign_errors() {
        assert!(EngineError::NotFound(AnnotationId::from("a")).is_benign());
        assert!(EngineError::DegenerateGeometry(AnnotationType::Line).is_benign());
        assert!(EngineError::DuplicateId(AnnotationId::from("a")).is_benign());
        assert!(!EngineError::Invalid(InvalidAnnotation::PageNumber).is_benign());
    }
}
