use crate::collection::CollectionSubscription;
use crate::config::SubscriberConfig;
use crate::document::DocumentSubscription;
use portal_store::{DocumentStore, Query};
use portal_types::DocumentId;
use std::sync::Arc;

/// Creates live subscriptions against an injected store.
///
/// Every subscription is independent: two subscriptions to the same query
/// each open their own listener and hold their own materialized copy.
/// Subscribing spawns a task, so it must happen inside a tokio runtime.
#[derive(Clone)]
pub struct Subscriber {
    store: Arc<dyn DocumentStore>,
    config: SubscriberConfig,
}

impl Subscriber {
    /// Creates a subscriber with the default configuration.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, SubscriberConfig::default())
    }

    /// Creates a subscriber with a custom configuration.
    pub fn with_config(store: Arc<dyn DocumentStore>, config: SubscriberConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SubscriberConfig {
        &self.config
    }

    /// Subscribes to the results of `query`.
    pub fn collection(&self, query: Query) -> CollectionSubscription {
        CollectionSubscription::open(Arc::clone(&self.store), self.config.clone(), query)
    }

    /// Subscribes to one document. An empty `id` yields a settled
    /// subscription with no data and no listener.
    pub fn document(&self, collection: impl Into<String>, id: impl Into<DocumentId>) -> DocumentSubscription {
        DocumentSubscription::open(Arc::clone(&self.store), collection.into(), id.into())
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
