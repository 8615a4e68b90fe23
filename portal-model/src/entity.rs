use crate::schema::collections;
use crate::value::FieldValue;
use chrono::{DateTime, SecondsFormat, Utc};
use portal_types::DocumentId;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// The field name under which a document's store id is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    /// `uid`, used by the users collection.
    Uid,
    /// `id`, used by every other collection.
    Id,
}

impl IdentityKey {
    /// `Uid` when the collection is exactly `users`, else `Id`.
    pub fn for_collection(collection: &str) -> Self {
        if collection == collections::USERS {
            Self::Uid
        } else {
            Self::Id
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uid => "uid",
            Self::Id => "id",
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level value of a materialized entity.
///
/// Top-level store timestamps become [`EntityValue::DateTime`]. Everything
/// else, nested timestamps included, is carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityValue {
    DateTime(DateTime<Utc>),
    Field(FieldValue),
}

impl EntityValue {
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::Field(_) => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldValue> {
        match self {
            Self::Field(value) => Some(value),
            Self::DateTime(_) => None,
        }
    }

    /// Date-times render as RFC 3339 with a `Z` suffix.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::DateTime(dt) => {
                serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Field(value) => value.to_json(),
        }
    }
}

impl Serialize for EntityValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::DateTime(dt) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Field(value) => value.serialize(serializer),
        }
    }
}

/// A stored document after normalization.
///
/// The identity field is held apart from the data fields, so no stored field
/// can shadow it: the value under [`Self::identity_key`] is always the
/// store-assigned [`DocumentId`].
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedEntity {
    pub(crate) identity: IdentityKey,
    pub(crate) id: DocumentId,
    pub(crate) fields: BTreeMap<String, EntityValue>,
}

impl MaterializedEntity {
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn identity_key(&self) -> IdentityKey {
        self.identity
    }

    /// Data fields, excluding the identity field.
    pub fn fields(&self) -> &BTreeMap<String, EntityValue> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&EntityValue> {
        self.fields.get(name)
    }

    /// String view of a field. The identity key resolves to the document id.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        if name == self.identity.as_str() {
            return Some(self.id.as_str());
        }
        self.get(name)?.as_field()?.as_str()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_field()?.as_bool()
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_field()?.as_f64()
    }

    pub fn get_datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name)?.as_datetime()
    }

    pub fn get_array(&self, name: &str) -> Option<&[FieldValue]> {
        self.get(name)?.as_field()?.as_array()
    }

    /// Renders the entity as a flat JSON object with the identity field set.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::with_capacity(self.fields.len() + 1);
        object.insert(
            self.identity.as_str().to_string(),
            serde_json::Value::String(self.id.as_str().to_string()),
        );
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(object)
    }
}

impl Serialize for MaterializedEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(self.identity.as_str(), self.id.as_str())?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
