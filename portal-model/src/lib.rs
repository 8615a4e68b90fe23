//! Entity model for the portal data layer.
//!
//! Defines the types that sit between the document store and UI state:
//! - [`FieldValue`]: a tagged field value; store timestamps are their own variant
//! - [`RawRecord`]: the top-level field map of one stored document
//! - [`CollectionSchema`] / [`SchemaRegistry`]: which fields a collection stores as timestamps
//! - [`MaterializedEntity`]: a record with timestamps converted and its identity field injected
//! - [`materialize`] / [`materialize_all`]: the conversion itself
//!
//! Timestamp detection happens once, at the store boundary, when JSON is
//! tagged into [`FieldValue::Timestamp`]. Materialization only ever matches
//! on that variant and never probes value shapes.

mod entity;
mod error;
mod materialize;
mod record;
mod schema;
mod value;

pub use entity::{EntityValue, IdentityKey, MaterializedEntity};
pub use error::{MaterializeError, ModelError, ModelResult};
pub use materialize::{materialize, materialize_all};
pub use record::RawRecord;
pub use schema::{collections, CollectionSchema, SchemaRegistry};
pub use value::FieldValue;
