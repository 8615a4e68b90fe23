//! Entity materialization.
//!
//! Turns a raw stored record into the entity UI state holds: top-level
//! timestamps become native date/times and the document id is injected under
//! the collection's identity key. Conversion is shallow and there is no
//! schema validation.

use crate::entity::{EntityValue, IdentityKey, MaterializedEntity};
use crate::error::MaterializeError;
use crate::record::RawRecord;
use crate::value::FieldValue;
use portal_types::DocumentId;

/// Materializes one document of `collection`.
///
/// A raw field that collides with the identity key is dropped; the
/// store-assigned `id` always wins.
pub fn materialize(
    collection: &str,
    id: &DocumentId,
    raw: &RawRecord,
) -> Result<MaterializedEntity, MaterializeError> {
    let identity = IdentityKey::for_collection(collection);

    let mut fields = std::collections::BTreeMap::new();
    for (name, value) in raw.iter() {
        if name == identity.as_str() {
            continue;
        }
        let value = match value {
            FieldValue::Timestamp(ts) => {
                let dt = ts.to_datetime().map_err(|source| MaterializeError {
                    document: id.clone(),
                    field: name.clone(),
                    source,
                })?;
                EntityValue::DateTime(dt)
            }
            other => EntityValue::Field(other.clone()),
        };
        fields.insert(name.clone(), value);
    }

    Ok(MaterializedEntity {
        identity,
        id: id.clone(),
        fields,
    })
}

/// Materializes a batch, preserving input order.
///
/// The first failure aborts the whole batch so callers never see a
/// partially converted result.
pub fn materialize_all<'a, I>(
    collection: &str,
    documents: I,
) -> Result<Vec<MaterializedEntity>, MaterializeError>
where
    I: IntoIterator<Item = (&'a DocumentId, &'a RawRecord)>,
{
    documents
        .into_iter()
        .map(|(id, raw)| materialize(collection, id, raw))
        .collect()
}
