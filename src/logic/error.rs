//! Error taxonomy for the ingestion-to-score pipeline.
//!
//! Normalization and extraction errors go straight back to the caller; a
//! malformed log must never be scored as if it were an empty window.

use std::path::PathBuf;

use thiserror::Error;

use super::source::SourceKind;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Why a raw record failed validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("field `{field}` expected {expected}, got {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("invalid timestamp format in `{field}`: {value:?}")]
    InvalidTimestamp { field: String, value: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid {kind} log format: {issue}")]
    Validation {
        kind: SourceKind,
        issue: ValidationIssue,
    },

    #[error("unsupported log source: {0}")]
    UnsupportedSource(String),

    #[error("{expected} window contains a {found} record")]
    SourceMismatch {
        expected: SourceKind,
        found: SourceKind,
    },

    #[error("window length must be at least one minute, got {0}")]
    InvalidWindow(u32),

    #[error("failed to initialize model at {}: {reason}", .path.display())]
    ModelInit { path: PathBuf, reason: String },

    #[error("model has not been trained")]
    ModelNotTrained,

    #[error("feature shape mismatch: expected {expected} features, got {actual}")]
    FeatureShape { expected: usize, actual: usize },

    #[error("feature {index} is not a finite number")]
    NonFiniteFeature { index: usize },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("failed to persist model to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn validation(kind: SourceKind, issue: ValidationIssue) -> Self {
        PipelineError::Validation { kind, issue }
    }

    pub(crate) fn model_init(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::ModelInit {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
