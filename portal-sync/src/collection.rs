use crate::config::SubscriberConfig;
use crate::live::{drive, Live};
use crate::state::CollectionState;
use portal_model::{materialize_all, MaterializedEntity};
use portal_store::{DocumentStore, Query, QuerySnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// A live, materialized view of a collection query.
///
/// Data is the query's result set in store order. Dropping the handle tears
/// the subscription down.
pub struct CollectionSubscription {
    store: Arc<dyn DocumentStore>,
    config: SubscriberConfig,
    query: Query,
    live: Live<Vec<MaterializedEntity>>,
}

impl CollectionSubscription {
    pub(crate) fn open(store: Arc<dyn DocumentStore>, config: SubscriberConfig, query: Query) -> Self {
        let mut subscription = Self {
            store,
            config,
            query,
            live: Live::new(CollectionState::loading(Vec::new())),
        };
        subscription.start();
        subscription
    }

    fn start(&mut self) {
        debug!(collection = self.query.collection_name(), "subscribing to collection");
        let store = Arc::clone(&self.store);
        let query = self.query.clone();
        self.live.start(CollectionState::loading(Vec::new()), move |publisher| async move {
            let collection = query.collection_name().to_string();
            let listener = store.listen_collection(&query).await;
            drive(listener, publisher, collection.clone(), |snapshot: &QuerySnapshot| {
                materialize_all(&collection, snapshot.iter())
            })
            .await;
        });
    }

    /// The query currently subscribed to.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// A copy of the current state.
    pub fn state(&self) -> CollectionState {
        self.live.state()
    }

    /// A receiver that observes every state change, across re-subscriptions.
    pub fn watch(&self) -> watch::Receiver<CollectionState> {
        self.live.watch()
    }

    /// Waits for the next state change and returns the new state.
    pub async fn changed(&mut self) -> CollectionState {
        self.live.changed().await
    }

    /// Waits until the first snapshot or error has been processed.
    pub async fn settled(&mut self) -> CollectionState {
        self.live.settled().await
    }

    /// Points the subscription at `query`, re-opening it if needed.
    ///
    /// A change of collection always re-subscribes. A change of constraints
    /// alone re-subscribes unless
    /// [`SubscriberConfig::resubscribe_on_constraint_change`] is off.
    /// Re-subscribing discards the old data and resets `loading`. Returns
    /// whether a new subscription was opened.
    pub fn resubscribe(&mut self, query: Query) -> bool {
        if query == self.query {
            return false;
        }
        let same_collection = query.collection_name() == self.query.collection_name();
        if same_collection && !self.config.resubscribe_on_constraint_change {
            debug!(
                collection = self.query.collection_name(),
                "constraints changed; keeping existing subscription"
            );
            return false;
        }
        self.query = query;
        self.start();
        true
    }

    /// Tears the subscription down. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        debug!(collection = self.query.collection_name(), "unsubscribing from collection");
    }
}

impl std::fmt::Debug for CollectionSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSubscription")
            .field("query", &self.query)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
