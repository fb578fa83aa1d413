use std::path::PathBuf;

use thiserror::Error;

use crate::types::EntityKind;

/// Convenience result type for file-level pipeline operations.
pub type EtlResult<T> = Result<T, EtlError>;

/// Convenience result type for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// File-level error.
///
/// Anything that escapes extraction or the row loop of a single file is reported with this type;
/// the orchestrator recovers it at the run level by relocating the file to the errors location.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Excel extraction error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV extraction error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Error report serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file cannot be parsed as any supported tabular format.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// Moving a file between locations failed.
    #[error("failed to relocate '{}': {source}", path.display())]
    Relocation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store could not be opened or released.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] Box<figment::Error>),
}

/// Row-level coercion error raised by a transformer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// A column expected to carry a UUID holds something else.
    #[error("invalid UUID in column '{column}': {raw}")]
    InvalidIdentifier { column: String, raw: String },

    /// A numeric value does not fit the target integer column.
    #[error("value out of range for column '{column}': {raw}")]
    OutOfRange { column: String, raw: String },

    /// The entity kind has no transformer bound.
    #[error("no transformer for {0}")]
    NoTransformer(EntityKind),
}

/// Error returned by the persistence collaborator.
///
/// The loader treats every variant identically: the row is dropped and the message recorded.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// A unique key already exists.
    #[error("duplicate {entity} {field}: {value}")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// A referenced record does not exist.
    #[error("{entity} references missing {target} {value}")]
    ForeignKey {
        entity: &'static str,
        target: &'static str,
        value: String,
    },

    /// A required field is absent.
    #[error("{entity}.{field} must not be null")]
    NotNull {
        entity: &'static str,
        field: &'static str,
    },

    /// A check constraint failed.
    #[error("check constraint {constraint} violated: {message}")]
    Check {
        constraint: &'static str,
        message: String,
    },

    /// The backing storage cannot be reached or written.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The session was already released.
    #[error("store session is closed")]
    Closed,
}
