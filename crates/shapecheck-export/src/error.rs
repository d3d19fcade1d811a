//! Export error types

use thiserror::Error;

/// Errors raised while exporting a schema
#[derive(Error, Debug)]
pub enum ExportError {
    /// A standalone document needs an object at its root
    #[error("schema {schema} cannot be converted to a JSON-Schema document")]
    NotAnObject { schema: String },

    /// A user-supplied override is neither a boolean nor an object
    #[error("invalid JSON-Schema override on {schema}: {found}")]
    InvalidOverride { schema: String, found: String },

    /// A literal could not be expressed as JSON
    #[error("literal cannot be expressed as JSON: {0}")]
    Literal(#[from] serde_json::Error),
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
