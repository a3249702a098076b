use thiserror::Error;

use crate::ir::Domain;

pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors raised while configuring an exporter or validating layer inputs.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unknown domain '{0}': expected 'enterprise' or 'mobile', optionally prefixed with 'mitre-'")]
    UnknownDomain(String),

    #[error("{type_name}.{field}: expected {expected}")]
    InvalidField {
        type_name: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("Gradient.colors[{index}]: '{value}' is not a recognized color")]
    InvalidColor { index: usize, value: String },

    #[error("Gradient: minValue {min} is greater than maxValue {max}")]
    InvertedRange { min: i64, max: i64 },

    #[error("Gradient: minValue and maxValue are both {0}, a multi-stop gradient needs a non-empty range")]
    EmptyRange(i64),

    #[error("invalid match rule '{0}': expected TECHNIQUE_ID or TECHNIQUE_ID@tactic-key")]
    InvalidRule(String),

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Errors from a matrix provider.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("matrix data has no tactics for domain '{0}'")]
    MissingDomain(Domain),

    #[error("failed to read matrix data: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid matrix data: {0}")]
    Json(#[from] serde_json::Error),
}
