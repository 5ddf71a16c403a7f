//! Error types for the statistics layer.
//!
//! All failures surface synchronously to the caller of a statistics
//! operation; nothing is retried here. The only value-level downgrade is the
//! null→NaN mapping for individual numeric cells, which is a data convention
//! handled by the decoder rather than an error path.

use thiserror::Error;

use crate::schema::ColumnKind;

/// The main error type for term-stats.
#[derive(Error, Debug)]
pub enum StatsError {
    /// A quantile was requested on a column that is neither integral nor fractional.
    #[error("Unsupported column type for '{column}': {kind} (only numeric columns are supported)")]
    UnsupportedColumnType {
        /// Name of the offending column
        column: String,
        /// Declared kind of the column
        kind: ColumnKind,
    },

    /// The engine returned a result shaped differently from the query that was built.
    #[error("Engine contract violation: {0}")]
    EngineContractViolation(String),

    /// A requested column is not part of the dataset schema.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Caller supplied an argument the operation cannot work with.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An identifier was rejected before being placed in query text.
    #[error("Security error: {0}")]
    Security(String),

    /// Raised by ingestion paths for sources they cannot read.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// Raised by ingestion paths for operations they do not offer.
    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error reported by a query engine that is not DataFusion-backed.
    #[error("Engine error: {message}")]
    Engine {
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// A type alias for `Result<T, StatsError>`.
pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    /// Creates an engine contract violation with the given message.
    pub fn contract_violation(msg: impl Into<String>) -> Self {
        Self::EngineContractViolation(msg.into())
    }

    /// Creates an invalid argument error with the given message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates an engine error without an underlying source.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine {
            message: msg.into(),
            source: None,
        }
    }

    /// Creates an engine error wrapping the underlying cause.
    pub fn engine_with_source(
        msg: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Engine {
            message: msg.into(),
            source: Some(source),
        }
    }

    /// Returns true when the engine broke the result-shape contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::EngineContractViolation(_))
    }
}
