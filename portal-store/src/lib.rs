//! Document store boundary for the portal data layer.
//!
//! The subscription adapters in `portal-sync` only need three things from a
//! store: a way to describe a query, a push subscription for query results
//! and single documents, and a way to release that subscription. This crate
//! defines that contract and ships [`MemoryStore`], a live in-memory store
//! used by the gateway and by tests.
//!
//! # Architecture
//!
//! - [`Query`] / [`QueryConstraint`] describe what to listen to; only stores interpret them
//! - [`DocumentStore`] opens listeners and may fail during setup
//! - [`Listener`] pairs a stream of snapshot-or-error events with a [`ListenerRegistration`]
//! - Releasing a registration is best-effort and may itself fail

mod error;
mod memory;
mod query;
mod snapshot;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use query::{Direction, FilterOp, Query, QueryConstraint};
pub use snapshot::{DocumentSnapshot, QuerySnapshot, StoredDocument};
pub use store::{DocumentStore, Listener, ListenerRegistration, SnapshotEvents};
