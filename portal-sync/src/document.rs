use crate::live::{drive, Live};
use crate::state::DocumentState;
use portal_model::{materialize, MaterializedEntity};
use portal_store::{DocumentSnapshot, DocumentStore};
use portal_types::DocumentId;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// A live, materialized view of one document.
///
/// `data` is `None` while the document does not exist. An empty document id
/// settles immediately with no data and opens no listener.
pub struct DocumentSubscription {
    store: Arc<dyn DocumentStore>,
    collection: String,
    id: DocumentId,
    live: Live<Option<MaterializedEntity>>,
}

impl DocumentSubscription {
    pub(crate) fn open(store: Arc<dyn DocumentStore>, collection: String, id: DocumentId) -> Self {
        let initial = if id.is_empty() {
            DocumentState::idle(None)
        } else {
            DocumentState::loading(None)
        };
        let mut subscription = Self {
            store,
            collection,
            id,
            live: Live::new(initial),
        };
        subscription.start();
        subscription
    }

    fn start(&mut self) {
        if self.id.is_empty() {
            debug!(collection = %self.collection, "empty document id; not subscribing");
            self.live.settle(DocumentState::idle(None));
            return;
        }

        debug!(collection = %self.collection, id = %self.id, "subscribing to document");
        let store = Arc::clone(&self.store);
        let collection = self.collection.clone();
        let id = self.id.clone();
        self.live.start(DocumentState::loading(None), move |publisher| async move {
            let target = format!("{collection}/{id}");
            let listener = store.listen_document(&collection, &id).await;
            drive(listener, publisher, target, |snapshot: &DocumentSnapshot| {
                snapshot
                    .data
                    .as_ref()
                    .map(|raw| materialize(&collection, &snapshot.id, raw))
                    .transpose()
            })
            .await;
        });
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// A copy of the current state.
    pub fn state(&self) -> DocumentState {
        self.live.state()
    }

    /// A receiver that observes every state change, across re-subscriptions.
    pub fn watch(&self) -> watch::Receiver<DocumentState> {
        self.live.watch()
    }

    /// Waits for the next state change and returns the new state.
    pub async fn changed(&mut self) -> DocumentState {
        self.live.changed().await
    }

    /// Waits until the first snapshot or error has been processed.
    pub async fn settled(&mut self) -> DocumentState {
        self.live.settled().await
    }

    /// Re-opens the subscription if the (collection, id) pair changed.
    /// Returns whether it did.
    pub fn resubscribe(&mut self, collection: impl Into<String>, id: impl Into<DocumentId>) -> bool {
        let collection = collection.into();
        let id = id.into();
        if collection == self.collection && id == self.id {
            return false;
        }
        self.collection = collection;
        self.id = id;
        self.start();
        true
    }

    /// Tears the subscription down. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        debug!(collection = %self.collection, id = %self.id, "unsubscribing from document");
    }
}

impl std::fmt::Debug for DocumentSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSubscription")
            .field("collection", &self.collection)
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
