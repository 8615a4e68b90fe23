//! Live subscription adapters for the portal data layer.
//!
//! Every screen of the portal reads through this crate. A subscription opens
//! a store listener, materializes each pushed snapshot and exposes the
//! result as a [`SubscriptionState`]: the data, a loading flag and the last
//! error.
//!
//! # Components
//!
//! - **Subscriber**: entry point; holds the injected store and configuration
//! - **CollectionSubscription**: live query results as an ordered entity list
//! - **DocumentSubscription**: one live document, or `None` when it does not exist
//!
//! # Lifecycle
//!
//! 1. **Subscribe**: `loading` is true and a task is spawned to open the listener
//! 2. **Snapshot**: each snapshot is materialized; data replaces the previous value,
//!    `loading` and `error` clear
//! 3. **Failure**: setup, snapshot and materialization failures set `error`
//!    and clear `loading`; data keeps its last value and nothing is retried
//! 4. **Teardown**: dropping the handle aborts the task and removes the listener;
//!    removal failures are logged and discarded
//!
//! # Example
//!
//! ```no_run
//! use portal_store::{MemoryStore, Query};
//! use portal_sync::Subscriber;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let subscriber = Subscriber::new(Arc::new(MemoryStore::new()));
//! let mut projects = subscriber.collection(Query::collection("projects"));
//! let state = projects.settled().await;
//! println!("{} projects", state.data.len());
//! # }
//! ```

mod collection;
mod config;
mod document;
mod error;
mod live;
mod state;
mod subscriber;

pub use collection::CollectionSubscription;
pub use config::SubscriberConfig;
pub use document::DocumentSubscription;
pub use error::SubscriptionError;
pub use state::{CollectionState, DocumentState, SubscriptionState};
pub use subscriber::Subscriber;
