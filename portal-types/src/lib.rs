//! Store-level primitive types for the portal data layer.
//!
//! This crate defines the values that cross the document-store boundary
//! before any normalization happens:
//! - [`DocumentId`], the stable store-assigned identifier of a document
//! - [`StoreTimestamp`], the store's wrapper around an instant in time
//!
//! Entity-level types (field maps, materialized entities) live in
//! `portal-model`; this crate has no knowledge of collections or schemas.

mod ids;
mod timestamp;

pub use ids::DocumentId;
pub use timestamp::StoreTimestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid timestamp: {seconds}s + {nanos}ns is not representable")]
    InvalidTimestamp { seconds: i64, nanos: u32 },

    #[error("invalid document id: {0:?}")]
    InvalidDocumentId(String),
}
