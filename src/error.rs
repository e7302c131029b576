//! Errors raised when raw tracking input breaks its shape contract.
//!
//! A fix in the wrong hemisphere or an entity with too few fixes is expected
//! noise and never shows up here; these variants mean the upstream producer
//! handed over something that cannot be aggregated at all.

/// Error type for input decoding and pipeline configuration.
#[derive(thiserror::Error, Debug)]
pub enum RollupError {
    #[error("record {index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index}: invalid `{field}`: {reason}")]
    InvalidField {
        index: usize,
        field: &'static str,
        reason: String,
    },

    #[error("unsupported payload: {0}")]
    UnsupportedPayload(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

pub type RollupResult<T> = Result<T, RollupError>;
