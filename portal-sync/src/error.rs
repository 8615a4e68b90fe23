//! Error types for subscriptions.

use portal_model::MaterializeError;
use portal_store::StoreError;
use thiserror::Error;

/// A failure surfaced through a subscription's `error` field.
///
/// Nothing is thrown across the subscribe boundary; callers observe these
/// only through [`crate::SubscriptionState`]. Listener removal failures are
/// never surfaced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubscriptionError {
    /// The listener could not be opened.
    #[error("subscription setup failed: {0}")]
    Setup(#[source] StoreError),

    /// The store pushed an error instead of a snapshot.
    #[error("snapshot error: {0}")]
    Snapshot(#[source] StoreError),

    /// A snapshot could not be materialized.
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

impl SubscriptionError {
    /// The underlying store error, if the store reported one.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Setup(e) | Self::Snapshot(e) => Some(e),
            Self::Materialize(_) => None,
        }
    }
}
