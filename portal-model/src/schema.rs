use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Names of the collections the portal reads.
pub mod collections {
    /// The only collection whose identity field is `uid`.
    pub const USERS: &str = "users";
    pub const PROJECTS: &str = "projects";
    pub const ANNOUNCEMENTS: &str = "announcements";
    pub const CONTRACTS: &str = "contracts";
    pub const WIKI: &str = "wiki";
}

/// Declares which top-level fields of a collection hold store timestamps.
///
/// This is the allow-list the store boundary consults when tagging raw JSON;
/// fields not listed are never treated as timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub collection: String,
    #[serde(default)]
    pub timestamp_fields: Vec<String>,
}

impl CollectionSchema {
    /// A schema with no timestamp fields.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            timestamp_fields: Vec::new(),
        }
    }

    /// Adds a timestamp field to the allow-list.
    #[must_use]
    pub fn with_timestamp(mut self, field: impl Into<String>) -> Self {
        self.timestamp_fields.push(field.into());
        self
    }

    pub fn is_timestamp_field(&self, field: &str) -> bool {
        self.timestamp_fields.iter().any(|f| f == field)
    }
}

/// Collection schemas keyed by collection name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, CollectionSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the portal's own collections.
    pub fn portal() -> Self {
        let mut registry = Self::new();
        registry.register(
            CollectionSchema::new(collections::USERS)
                .with_timestamp("createdAt")
                .with_timestamp("lastLogin"),
        );
        registry.register(
            CollectionSchema::new(collections::PROJECTS)
                .with_timestamp("createdAt")
                .with_timestamp("updatedAt")
                .with_timestamp("deadline"),
        );
        registry.register(
            CollectionSchema::new(collections::ANNOUNCEMENTS)
                .with_timestamp("createdAt")
                .with_timestamp("updatedAt"),
        );
        registry.register(
            CollectionSchema::new(collections::CONTRACTS)
                .with_timestamp("createdAt")
                .with_timestamp("updatedAt")
                .with_timestamp("signedAt"),
        );
        registry.register(
            CollectionSchema::new(collections::WIKI)
                .with_timestamp("createdAt")
                .with_timestamp("updatedAt"),
        );
        registry
    }

    /// Registers a schema, replacing any previous one for the same collection.
    pub fn register(&mut self, schema: CollectionSchema) {
        self.schemas.insert(schema.collection.clone(), schema);
    }

    pub fn get(&self, collection: &str) -> Option<&CollectionSchema> {
        self.schemas.get(collection)
    }

    /// Returns the registered schema, or an empty allow-list for unknown
    /// collections.
    pub fn schema_for(&self, collection: &str) -> CollectionSchema {
        self.get(collection)
            .cloned()
            .unwrap_or_else(|| CollectionSchema::new(collection))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
