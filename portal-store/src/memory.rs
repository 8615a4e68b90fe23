//! In-memory live document store.
//!
//! Holds collections in process and pushes a fresh snapshot to every
//! affected listener after each write. Listeners receive the current state
//! as soon as they are opened.
//!
//! The store also carries fault injection hooks (rejected listens, pushed
//! listener errors, failing unsubscribes) so every error path of the
//! subscription adapters can be driven deterministically.

use crate::error::{StoreError, StoreResult};
use crate::query::{Direction, Query};
use crate::snapshot::{DocumentSnapshot, QuerySnapshot, StoredDocument};
use crate::store::{DocumentStore, Listener, ListenerRegistration};
use async_trait::async_trait;
use portal_model::RawRecord;
use portal_types::DocumentId;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;
use tracing::{debug, trace};

type Documents = BTreeMap<DocumentId, RawRecord>;

enum Watcher {
    Query {
        query: Query,
        tx: mpsc::UnboundedSender<StoreResult<QuerySnapshot>>,
    },
    Document {
        collection: String,
        id: DocumentId,
        tx: mpsc::UnboundedSender<StoreResult<DocumentSnapshot>>,
    },
}

impl Watcher {
    fn collection(&self) -> &str {
        match self {
            Self::Query { query, .. } => query.collection_name(),
            Self::Document { collection, .. } => collection,
        }
    }

    /// Pushes the current state if `changed` affects this watcher.
    fn notify(&self, documents: Option<&Documents>, changed: &DocumentId) {
        match self {
            Self::Query { query, tx } => {
                let _ = tx.send(Ok(evaluate(query, documents)));
            }
            Self::Document { id, tx, .. } if id == changed => {
                let _ = tx.send(Ok(document_snapshot(id, documents)));
            }
            Self::Document { .. } => {}
        }
    }

    fn fail(&self, error: &StoreError) {
        match self {
            Self::Query { tx, .. } => {
                let _ = tx.send(Err(error.clone()));
            }
            Self::Document { tx, .. } => {
                let _ = tx.send(Err(error.clone()));
            }
        }
    }
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Documents>,
    watchers: BTreeMap<u64, Watcher>,
    next_watcher: u64,
    listen_calls: usize,
    reject_listens: Option<StoreError>,
    fail_unsubscribe: bool,
}

impl Inner {
    fn register(&mut self, watcher: Watcher) -> u64 {
        let id = self.next_watcher;
        self.next_watcher += 1;
        self.watchers.insert(id, watcher);
        id
    }

    fn notify(&self, collection: &str, changed: &DocumentId) {
        let documents = self.collections.get(collection);
        for watcher in self.watchers.values() {
            if watcher.collection() == collection {
                watcher.notify(documents, changed);
            }
        }
    }
}

/// A live, in-process document store.
///
/// Cloning is cheap and every clone shares the same data and listeners.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Creates or replaces a document.
    pub fn set(&self, collection: &str, id: impl Into<DocumentId>, data: RawRecord) {
        let id = id.into();
        let mut inner = self.lock();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        trace!(collection, %id, "document set");
        inner.notify(collection, &id);
    }

    /// Adds a document under a generated id.
    pub fn add(&self, collection: &str, data: RawRecord) -> DocumentId {
        let id = DocumentId::generate();
        self.set(collection, id.clone(), data);
        id
    }

    /// Shallow-merges `patch` into an existing document.
    pub fn update(&self, collection: &str, id: &DocumentId, patch: RawRecord) -> StoreResult<()> {
        let mut inner = self.lock();
        let record = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        record.merge(patch);
        trace!(collection, %id, "document updated");
        inner.notify(collection, id);
        Ok(())
    }

    /// Deletes a document. Returns whether it existed.
    pub fn delete(&self, collection: &str, id: &DocumentId) -> bool {
        let mut inner = self.lock();
        let existed = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if existed {
            trace!(collection, %id, "document deleted");
            inner.notify(collection, id);
        }
        existed
    }

    // ── Reads ────────────────────────────────────────────────────

    pub fn get(&self, collection: &str, id: &DocumentId) -> Option<RawRecord> {
        self.lock().collections.get(collection)?.get(id).cloned()
    }

    /// Runs a one-off query.
    pub fn query(&self, query: &Query) -> StoreResult<QuerySnapshot> {
        query.validate()?;
        let inner = self.lock();
        Ok(evaluate(query, inner.collections.get(query.collection_name())))
    }

    // ── Fault injection & introspection ──────────────────────────

    /// While set, every listen call fails with `error`.
    pub fn reject_listens(&self, error: Option<StoreError>) {
        self.lock().reject_listens = error;
    }

    /// Pushes `error` to every open listener on `collection`. Listeners stay
    /// open.
    pub fn fail_listeners(&self, collection: &str, error: StoreError) {
        let inner = self.lock();
        for watcher in inner.watchers.values() {
            if watcher.collection() == collection {
                watcher.fail(&error);
            }
        }
    }

    /// While true, removing a listener fails and the listener stays
    /// registered.
    pub fn fail_unsubscribe(&self, fail: bool) {
        self.lock().fail_unsubscribe = fail;
    }

    /// Number of listen calls made, successful or not.
    pub fn listen_calls(&self) -> usize {
        self.lock().listen_calls
    }

    /// Number of currently registered listeners.
    pub fn active_listeners(&self) -> usize {
        self.lock().watchers.len()
    }

    fn begin_listen(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        inner.listen_calls += 1;
        match &inner.reject_listens {
            Some(error) => Err(error.clone()),
            None => Ok(inner),
        }
    }

    fn registration(&self, watcher: u64) -> MemoryRegistration {
        MemoryRegistration {
            inner: Arc::downgrade(&self.inner),
            watcher,
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemoryStore")
            .field("collections", &inner.collections.len())
            .field("listeners", &inner.watchers.len())
            .finish()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn listen_collection(&self, query: &Query) -> StoreResult<Listener<QuerySnapshot>> {
        let mut inner = self.begin_listen()?;
        query.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(evaluate(
            query,
            inner.collections.get(query.collection_name()),
        )));
        let watcher = inner.register(Watcher::Query {
            query: query.clone(),
            tx,
        });
        debug!(collection = query.collection_name(), watcher, "collection listener opened");
        drop(inner);

        Ok(Listener::new(rx, self.registration(watcher)))
    }

    async fn listen_document(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<Listener<DocumentSnapshot>> {
        let mut inner = self.begin_listen()?;
        if id.is_empty() {
            return Err(StoreError::InvalidQuery("empty document id".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(document_snapshot(id, inner.collections.get(collection))));
        let watcher = inner.register(Watcher::Document {
            collection: collection.to_string(),
            id: id.clone(),
            tx,
        });
        debug!(collection, %id, watcher, "document listener opened");
        drop(inner);

        Ok(Listener::new(rx, self.registration(watcher)))
    }
}

/// Registration handed out with each [`MemoryStore`] listener.
struct MemoryRegistration {
    inner: Weak<Mutex<Inner>>,
    watcher: u64,
}

impl ListenerRegistration for MemoryRegistration {
    fn remove(&mut self) -> StoreResult<()> {
        let Some(inner) = self.inner.upgrade() else {
            return Ok(());
        };
        let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.fail_unsubscribe {
            return Err(StoreError::Unsubscribe(format!(
                "listener {} could not be removed",
                self.watcher
            )));
        }
        if inner.watchers.remove(&self.watcher).is_some() {
            debug!(watcher = self.watcher, "listener removed");
        }
        Ok(())
    }
}

fn document_snapshot(id: &DocumentId, documents: Option<&Documents>) -> DocumentSnapshot {
    DocumentSnapshot {
        id: id.clone(),
        data: documents.and_then(|docs| docs.get(id)).cloned(),
    }
}

/// Filters, orders and limits a collection. Documents missing an ordered
/// field are excluded. Ties keep id order.
fn evaluate(query: &Query, documents: Option<&Documents>) -> QuerySnapshot {
    let Some(documents) = documents else {
        return QuerySnapshot::default();
    };
    let orderings: Vec<(&str, Direction)> = query.orderings().collect();

    let mut matched: Vec<StoredDocument> = documents
        .iter()
        .filter(|(_, record)| query.matches(record))
        .filter(|(_, record)| orderings.iter().all(|(field, _)| record.contains(field)))
        .map(|(id, record)| StoredDocument::new(id.clone(), record.clone()))
        .collect();

    if !orderings.is_empty() {
        matched.sort_by(|a, b| {
            for (field, direction) in &orderings {
                let ordering = match (a.data.get(field), b.data.get(field)) {
                    (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                };
                let ordering = match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    if let Some(limit) = query.limit_value() {
        matched.truncate(limit);
    }
    QuerySnapshot::new(matched)
}
