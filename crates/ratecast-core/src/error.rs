use thiserror::Error;

/// Validation and contract errors exposed by `ratecast-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("date must be YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("rate must be a finite positive number, got {value}")]
    InvalidRate { value: f64 },
    #[error("series timestamps must be strictly increasing: violation at index {index}")]
    NonMonotonicSeries { index: usize },
    #[error("series contains a point after the as-of date: '{ts}'")]
    FutureDatedPoint { ts: String },

    #[error("risk indicator must be finite and non-negative, got {value}")]
    InvalidRiskIndicator { value: f64 },

    #[error("invalid feed '{value}', expected one of nbp, fixture")]
    InvalidFeed { value: String },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("source_chain must contain at least one feed")]
    EmptySourceChain,

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
