//! Error types for queryfmtlib
//!
//! Only failures that must cross the render boundary live here. Recoverable
//! rendering problems (a missing template name, a zero-row export) are
//! collected as plain message strings and surfaced inline next to the
//! rendered output instead.

use thiserror::Error;

/// Errors that can occur while rendering a query result
#[derive(Error, Debug)]
pub enum QueryfmtError {
    /// The external triple serializer failed to produce output
    #[error("serializer failed: {0}")]
    Serializer(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No serializer collaborator was provided for an RDF export
    #[error("no serializer available for RDF output")]
    SerializerMissing,

    /// A row's field count does not match the declared column count
    #[error("row {row} has {fields} fields but {columns} columns were declared")]
    RowArity {
        row: usize,
        fields: usize,
        columns: usize,
    },

    /// JSON serialization or parsing failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
