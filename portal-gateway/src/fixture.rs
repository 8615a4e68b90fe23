//! Seed data for the in-memory store.
//!
//! A fixture is a JSON object of collections, each an object of document
//! id to document body:
//!
//! ```json
//! { "users": { "abc123": { "name": "Jane", "lastLogin": "2024-01-05T10:00:00Z" } } }
//! ```

use portal_model::{ModelError, RawRecord, SchemaRegistry};
use portal_store::MemoryStore;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed fixture: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad document {collection}/{id}: {source}")]
    Document {
        collection: String,
        id: String,
        #[source]
        source: ModelError,
    },
}

/// Collections of JSON documents keyed by id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Fixture {
    collections: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl Fixture {
    pub fn from_json_str(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Total number of documents.
    pub fn len(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes every document into `store`, tagging timestamp fields through
    /// `registry`. Returns the number of documents written.
    pub fn seed(&self, store: &MemoryStore, registry: &SchemaRegistry) -> Result<usize, FixtureError> {
        let mut written = 0;
        for (collection, documents) in &self.collections {
            let schema = registry.schema_for(collection);
            for (id, body) in documents {
                let record = RawRecord::from_json(body, &schema).map_err(|source| {
                    FixtureError::Document {
                        collection: collection.clone(),
                        id: id.clone(),
                        source,
                    }
                })?;
                store.set(collection, id.as_str(), record);
                written += 1;
            }
        }
        Ok(written)
    }
}
