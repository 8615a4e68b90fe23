//! Snapshots pushed by a store listener.

use portal_model::RawRecord;
use portal_types::DocumentId;

/// One document as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub data: RawRecord,
}

impl StoredDocument {
    pub fn new(id: impl Into<DocumentId>, data: RawRecord) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// The full result set of a query at one point in time, in store order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySnapshot {
    pub documents: Vec<StoredDocument>,
}

impl QuerySnapshot {
    pub fn new(documents: Vec<StoredDocument>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Id/record pairs in snapshot order.
    pub fn iter(&self) -> impl Iterator<Item = (&DocumentId, &RawRecord)> {
        self.documents.iter().map(|doc| (&doc.id, &doc.data))
    }
}

/// The state of a single document. `data` is `None` when the document does
/// not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    pub data: Option<RawRecord>,
}

impl DocumentSnapshot {
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }
}
