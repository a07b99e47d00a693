use thiserror::Error;

/// Validation and contract errors exposed by `tradepie-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,

    #[error("currency cannot be blank: '{value}'")]
    InvalidCurrency { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("polling period '{field}' must be greater than zero")]
    ZeroPeriod { field: &'static str },
    #[error("high frequency period ({high_ms}ms) must be shorter than low frequency period ({low_ms}ms)")]
    InvertedFrequencies { high_ms: u64, low_ms: u64 },

    #[error("chart dimensions must be positive: {width}x{height}")]
    InvalidChartDimensions { width: u32, height: u32 },

    #[error("endpoint must be an http(s) URL: '{value}'")]
    InvalidEndpoint { value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
