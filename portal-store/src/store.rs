//! The document store contract.

use crate::error::StoreResult;
use crate::query::Query;
use crate::snapshot::{DocumentSnapshot, QuerySnapshot};
use async_trait::async_trait;
use portal_types::DocumentId;
use tokio::sync::mpsc;

/// Stream of snapshot-or-error events pushed by a listener, in store order.
pub type SnapshotEvents<S> = mpsc::UnboundedReceiver<StoreResult<S>>;

/// Handle for releasing a store listener.
///
/// Subscribers only hold a registration once `listen_*` has returned. A
/// store whose `listen_*` suspends after registering must clean up on its
/// own if that future is dropped, since no registration exists to remove.
pub trait ListenerRegistration: Send {
    /// Stops delivery. May fail; callers treat failure as non-fatal.
    fn remove(&mut self) -> StoreResult<()>;
}

/// An open push subscription.
///
/// The store keeps emitting until the registration is removed. After an
/// error event the listener stays open and may deliver later snapshots.
pub struct Listener<S> {
    events: SnapshotEvents<S>,
    registration: Box<dyn ListenerRegistration>,
}

impl<S> Listener<S> {
    pub fn new(events: SnapshotEvents<S>, registration: impl ListenerRegistration + 'static) -> Self {
        Self {
            events,
            registration: Box::new(registration),
        }
    }

    /// Splits into the event stream and the registration.
    pub fn into_parts(self) -> (SnapshotEvents<S>, Box<dyn ListenerRegistration>) {
        (self.events, self.registration)
    }
}

impl<S> std::fmt::Debug for Listener<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").finish_non_exhaustive()
    }
}

/// A document store that supports live listeners.
///
/// Setup errors are returned directly. Errors after setup arrive as `Err`
/// events on the listener.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Opens a listener on a query's result set.
    async fn listen_collection(&self, query: &Query) -> StoreResult<Listener<QuerySnapshot>>;

    /// Opens a listener on a single document.
    async fn listen_document(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<Listener<DocumentSnapshot>>;
}
