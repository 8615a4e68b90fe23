//! Raw document records and their construction at the store boundary.

use crate::error::{ModelError, ModelResult};
use crate::schema::CollectionSchema;
use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use portal_types::StoreTimestamp;
use serde::Serialize;
use std::collections::BTreeMap;

/// The top-level field map of one stored document.
///
/// No schema is enforced: any field may be present or absent. Nested maps
/// and arrays are held as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Inserts a field, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates top-level fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Overwrites top-level fields with those of `patch`. Nested maps are
    /// replaced wholesale, not merged.
    pub fn merge(&mut self, patch: RawRecord) {
        self.fields.extend(patch.fields);
    }

    /// Builds a record from a JSON document body.
    ///
    /// Top-level fields listed as timestamps in `schema` are tagged as
    /// [`FieldValue::Timestamp`] when they hold either a
    /// `{"seconds", "nanoseconds"}` object (the `_seconds`/`_nanoseconds`
    /// spelling is accepted too) or an RFC 3339 string. Anything else,
    /// including nested values, converts structurally.
    pub fn from_json(value: &serde_json::Value, schema: &CollectionSchema) -> ModelResult<Self> {
        let object = match value {
            serde_json::Value::Object(map) => map,
            other => return Err(ModelError::NotAnObject(json_kind(other))),
        };

        let fields = object
            .iter()
            .map(|(name, value)| {
                let tagged = schema
                    .is_timestamp_field(name)
                    .then(|| parse_timestamp(value))
                    .flatten();
                let field = match tagged {
                    Some(ts) => FieldValue::Timestamp(ts),
                    None => FieldValue::from_json(value),
                };
                (name.clone(), field)
            })
            .collect();

        Ok(Self { fields })
    }

    /// Renders the record as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, FieldValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RawRecord {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

fn parse_timestamp(value: &serde_json::Value) -> Option<StoreTimestamp> {
    match value {
        serde_json::Value::Object(map) => {
            let seconds = map.get("seconds").or_else(|| map.get("_seconds"))?.as_i64()?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .map_or(Some(0), serde_json::Value::as_u64)?;
            let nanos = u32::try_from(nanos).ok()?;
            Some(StoreTimestamp::new(seconds, nanos))
        }
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| StoreTimestamp::from_datetime(dt.with_timezone(&Utc))),
        _ => None,
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
