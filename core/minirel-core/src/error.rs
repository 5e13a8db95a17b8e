//! Error types for the minirel execution engine.
//!
//! All public APIs return `MinirelResult<T>` — no panics in library code.

use thiserror::Error;

/// Unified error type for all minirel operations.
#[derive(Debug, Error)]
pub enum MinirelError {
    /// Standard I/O error (missing base file, unopenable run file, ...)
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Schema definition or validation error
    #[error("schema error: {0}")]
    Schema(String),

    /// Column reference that does not resolve against a header
    #[error("column '{column}' not found in schema [{schema}]")]
    ColumnNotFound { column: String, schema: String },

    /// Requested table does not exist in the catalog
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// Sort or join buffer budget too small for the algorithm
    #[error("invalid buffer size: {operator} needs at least {minimum} pages, got {actual}")]
    InvalidBufferSize {
        operator: &'static str,
        minimum: usize,
        actual: usize,
    },

    /// Operator precondition violated at construction time
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// A child operator could not be restarted when a rescan was required
    #[error("operator '{0}' cannot be reset")]
    NotRestartable(String),

    /// Expression evaluation failure (e.g. division by zero)
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Malformed page or B+-Tree file
    #[error("index error: {0}")]
    Index(String),

    /// Catalog / config serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// SQL parsing error
    #[error("SQL parse error: {message}\nSQL: {sql}")]
    SqlParse { message: String, sql: String },

    /// Unsupported SQL feature
    #[error("SQL feature not supported: {feature}\nHint: {hint}")]
    SqlNotSupported { feature: String, hint: String },

    /// Invalid configuration value
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for all minirel operations.
pub type MinirelResult<T> = Result<T, MinirelError>;

impl From<serde_json::Error> for MinirelError {
    fn from(err: serde_json::Error) -> Self {
        MinirelError::Serialization(err.to_string())
    }
}
