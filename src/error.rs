//! Error and warning types for the annotation pipeline.
//!
//! Errors are construction-time rejections that propagate to the caller.
//! Warnings are local, recoverable conditions: they are logged through
//! `tracing` where they happen and also collected into a [`Reported`]
//! value so callers can inspect them without a subscriber.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Label, SentenceId};

/// Errors raised while building spans from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    /// Offsets do not describe a non-empty range inside the sentence.
    #[error("invalid span {start}..{end} in sentence {sentence_id}: {reason}")]
    InvalidSpan {
        sentence_id: SentenceId,
        start: usize,
        end: usize,
        reason: String,
    },

    /// Concept spans come from the sentence text, never from a selection.
    #[error("label '{label}' cannot be applied to a selection")]
    UnselectableLabel { label: Label },
}

/// Errors raised while loading a [`SessionConfig`](crate::SessionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Recoverable conditions raised during merge or reclassification.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationWarning {
    /// A concept listed for a sentence does not occur in its text.
    #[error("concept '{concept}' does not occur in sentence {sentence_id}")]
    AmbiguousConceptOccurrence {
        sentence_id: SentenceId,
        concept: String,
    },
    /// Several new spans landed on one sentence in a single merge call.
    #[error("{count} new spans for sentence {sentence_id}, applied in input order")]
    MultipleNewSpansPerSentence {
        sentence_id: SentenceId,
        count: usize,
    },
}

/// A value together with the warnings collected while producing it.
#[derive(Debug, Clone)]
pub struct Reported<T> {
    pub value: T,
    pub warnings: Vec<AnnotationWarning>,
}

impl<T> Reported<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Record a warning and emit it to the `tracing` subscriber.
    pub fn add_warning(&mut self, warning: AnnotationWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Transform the value, keeping the collected warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reported<U> {
        Reported {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_collects_warnings() {
        let mut result = Reported::ok(3);
        assert!(!result.has_warnings());

        result.add_warning(AnnotationWarning::MultipleNewSpansPerSentence {
            sentence_id: SentenceId(4),
            count: 2,
        });
        assert!(result.has_warnings());

        let mapped = result.map(|v| v * 2);
        assert_eq!(mapped.value, 6);
        assert_eq!(mapped.warnings.len(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = AnnotationError::InvalidSpan {
            sentence_id: SentenceId(7),
            start: 5,
            end: 5,
            reason: "empty range".to_string(),
        };
        assert_eq!(err.to_string(), "invalid span 5..5 in sentence 7: empty range");
    }

    #[test]
    fn test_warning_display_and_serde() {
        let warning = AnnotationWarning::AmbiguousConceptOccurrence {
            sentence_id: SentenceId(47),
            concept: "globe award".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "concept 'globe award' does not occur in sentence 47"
        );

        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "ambiguous_concept_occurrence",
                "sentence_id": 47,
                "concept": "globe award"
            })
        );
        let back: AnnotationWarning = serde_json::from_value(json).unwrap();
        assert_eq!(back, warning);
    }
}
