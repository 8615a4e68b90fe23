//! Error types for the model layer.

use portal_types::DocumentId;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building records at the store boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A document body must be a JSON object.
    #[error("document body must be an object, got {0}")]
    NotAnObject(&'static str),
}

/// A document could not be materialized.
///
/// Carries the offending document and field so a failed batch can be traced
/// back to the record that broke it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to materialize field `{field}` of document {document}: {source}")]
pub struct MaterializeError {
    pub document: DocumentId,
    pub field: String,
    #[source]
    pub source: portal_types::Error,
}
