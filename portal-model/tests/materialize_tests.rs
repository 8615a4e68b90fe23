use chrono::{TimeZone, Utc};
use portal_model::{
    materialize, materialize_all, EntityValue, FieldValue, IdentityKey, RawRecord,
};
use portal_types::{DocumentId, StoreTimestamp};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn ts(dt: chrono::DateTime<Utc>) -> StoreTimestamp {
    StoreTimestamp::from_datetime(dt)
}

// ── Identity injection ───────────────────────────────────────────

#[test]
fn users_collection_uses_uid() {
    let entity = materialize("users", &DocumentId::new("abc123"), &RawRecord::new()).unwrap();
    assert_eq!(entity.identity_key(), IdentityKey::Uid);
    assert_eq!(entity.get_str("uid"), Some("abc123"));
    assert_eq!(entity.get_str("id"), None);
}

#[test]
fn other_collections_use_id() {
    for collection in ["projects", "announcements", "contracts", "wiki", "Users", "users2"] {
        let entity = materialize(collection, &DocumentId::new("x"), &RawRecord::new()).unwrap();
        assert_eq!(entity.identity_key(), IdentityKey::Id, "{collection}");
        assert_eq!(entity.get_str("id"), Some("x"));
    }
}

#[test]
fn store_id_overrides_conflicting_raw_field() {
    let raw = RawRecord::new().with("id", "forged").with("title", "X");
    let entity = materialize("projects", &DocumentId::new("p1"), &raw).unwrap();
    assert_eq!(entity.get_str("id"), Some("p1"));
    assert!(entity.get("id").is_none());
    assert_eq!(entity.to_json()["id"], "p1");
}

#[test]
fn conflicting_uid_in_users_is_replaced() {
    let raw = RawRecord::new().with("uid", 42i64);
    let entity = materialize("users", &DocumentId::new("abc"), &raw).unwrap();
    assert_eq!(entity.to_json(), json!({"uid": "abc"}));
}

#[test]
fn non_identity_key_with_other_name_is_kept() {
    // `id` is an ordinary field inside the users collection.
    let raw = RawRecord::new().with("id", "legacy");
    let entity = materialize("users", &DocumentId::new("abc"), &raw).unwrap();
    assert_eq!(entity.get_str("id"), Some("legacy"));
    assert_eq!(entity.get_str("uid"), Some("abc"));
}

// ── Timestamp conversion ─────────────────────────────────────────

#[test]
fn scenario_users_document() {
    let last_login = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
    let raw = RawRecord::new()
        .with("name", "Jane")
        .with("lastLogin", ts(last_login));

    let entity = materialize("users", &DocumentId::new("abc123"), &raw).unwrap();

    assert_eq!(entity.get_str("uid"), Some("abc123"));
    assert_eq!(entity.get_str("name"), Some("Jane"));
    assert_eq!(entity.get_datetime("lastLogin"), Some(last_login));
    assert_eq!(
        entity.to_json(),
        json!({"uid": "abc123", "name": "Jane", "lastLogin": "2024-01-05T10:00:00Z"})
    );
}

#[test]
fn scenario_projects_document() {
    let deadline = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let raw = RawRecord::new()
        .with("title", "X")
        .with("assignedTo", vec!["u1", "u2"])
        .with("deadline", ts(deadline));

    let entity = materialize("projects", &DocumentId::new("p1"), &raw).unwrap();

    assert_eq!(entity.get_str("id"), Some("p1"));
    assert_eq!(entity.get_str("title"), Some("X"));
    assert_eq!(
        entity.get_array("assignedTo"),
        Some(&[FieldValue::from("u1"), FieldValue::from("u2")][..])
    );
    assert_eq!(entity.get_datetime("deadline"), Some(deadline));
}

#[test]
fn nested_timestamps_are_not_converted() {
    let nested = StoreTimestamp::new(1_700_000_000, 0);
    let meta: std::collections::BTreeMap<String, FieldValue> =
        [("signedAt".to_string(), FieldValue::Timestamp(nested))].into();
    let raw = RawRecord::new()
        .with("meta", FieldValue::Map(meta.clone()))
        .with("history", vec![FieldValue::Timestamp(nested)]);

    let entity = materialize("contracts", &DocumentId::new("c1"), &raw).unwrap();

    assert_eq!(entity.get("meta"), Some(&EntityValue::Field(FieldValue::Map(meta))));
    assert_eq!(
        entity.get_array("history"),
        Some(&[FieldValue::Timestamp(nested)][..])
    );
}

#[test]
fn primitives_and_null_pass_through() {
    let raw = RawRecord::new()
        .with("active", true)
        .with("count", 3i64)
        .with("ratio", 0.5)
        .with("note", FieldValue::Null);

    let entity = materialize("wiki", &DocumentId::new("w1"), &raw).unwrap();

    assert_eq!(entity.get_bool("active"), Some(true));
    assert_eq!(entity.get_number("count"), Some(3.0));
    assert_eq!(entity.get_number("ratio"), Some(0.5));
    assert_eq!(entity.get("note"), Some(&EntityValue::Field(FieldValue::Null)));
}

#[test]
fn missing_fields_are_simply_absent() {
    let entity = materialize("projects", &DocumentId::new("p1"), &RawRecord::new()).unwrap();
    assert!(entity.fields().is_empty());
    assert_eq!(entity.get_str("title"), None);
}

// ── Failures ─────────────────────────────────────────────────────

#[test]
fn invalid_timestamp_fails_with_field_context() {
    let raw = RawRecord::new().with("createdAt", StoreTimestamp::new(0, 2_000_000_000));
    let err = materialize("projects", &DocumentId::new("p9"), &raw).unwrap_err();
    assert_eq!(err.document, DocumentId::new("p9"));
    assert_eq!(err.field, "createdAt");
    assert!(err.to_string().contains("createdAt"));
}

#[test]
fn batch_preserves_order() {
    let ids = [DocumentId::new("b"), DocumentId::new("a"), DocumentId::new("c")];
    let raw = RawRecord::new().with("n", 1i64);
    let docs: Vec<_> = ids.iter().map(|id| (id, &raw)).collect();

    let entities = materialize_all("projects", docs).unwrap();
    let order: Vec<&str> = entities.iter().map(|e| e.id().as_str()).collect();
    assert_eq!(order, vec!["b", "a", "c"]);
}

#[test]
fn batch_fails_as_a_whole() {
    let good = RawRecord::new().with("title", "ok");
    let bad = RawRecord::new().with("deadline", StoreTimestamp::new(0, u32::MAX));
    let (a, b) = (DocumentId::new("a"), DocumentId::new("b"));

    let err = materialize_all("projects", [(&a, &good), (&b, &bad)]).unwrap_err();
    assert_eq!(err.document, b);
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn serialize_matches_to_json() {
    let raw = RawRecord::new()
        .with("title", "Kickoff")
        .with("createdAt", StoreTimestamp::new(1_704_448_800, 500_000_000));
    let entity = materialize("announcements", &DocumentId::new("a1"), &raw).unwrap();

    let via_serde = serde_json::to_value(&entity).unwrap();
    assert_eq!(via_serde, entity.to_json());
    assert_eq!(via_serde["createdAt"], "2024-01-05T10:00:00.500Z");
}

#[test]
fn serialize_puts_identity_first() {
    let raw = RawRecord::new().with("a", 1i64);
    let entity = materialize("projects", &DocumentId::new("p1"), &raw).unwrap();
    let text = serde_json::to_string(&entity).unwrap();
    assert!(text.starts_with(r#"{"id":"p1""#), "{text}");
}

// ── Properties ───────────────────────────────────────────────────

fn collection_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("users".to_string()),
        Just("projects".to_string()),
        "[a-z]{1,10}",
    ]
}

fn field_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        any::<i64>().prop_map(FieldValue::Integer),
        "[a-zA-Z0-9 ]{0,16}".prop_map(FieldValue::String),
        (0i64..4_000_000_000, 0u32..1_000_000_000)
            .prop_map(|(s, n)| FieldValue::Timestamp(StoreTimestamp::new(s, n))),
    ]
}

fn record_strategy() -> impl Strategy<Value = RawRecord> {
    prop::collection::btree_map("(id|uid|[a-z]{1,8})", field_strategy(), 0..8)
        .prop_map(|fields| fields.into_iter().collect())
}

proptest! {
    /// The identity field always carries the store id.
    #[test]
    fn identity_always_matches_store_id(
        collection in collection_strategy(),
        id in "[a-zA-Z0-9]{1,20}",
        raw in record_strategy(),
    ) {
        let entity = materialize(&collection, &DocumentId::new(id.clone()), &raw).unwrap();
        let key = IdentityKey::for_collection(&collection);
        prop_assert_eq!(entity.get_str(key.as_str()), Some(id.as_str()));
        let json = entity.to_json();
        prop_assert_eq!(json[key.as_str()].as_str(), Some(id.as_str()));
    }

    /// Timestamps convert; everything else is unchanged.
    #[test]
    fn fields_convert_or_pass_through(
        collection in collection_strategy(),
        raw in record_strategy(),
    ) {
        let entity = materialize(&collection, &DocumentId::new("doc"), &raw).unwrap();
        let key = IdentityKey::for_collection(&collection);
        for (name, value) in raw.iter() {
            if name == key.as_str() {
                continue;
            }
            let expected = match value {
                FieldValue::Timestamp(ts) => EntityValue::DateTime(ts.to_datetime().unwrap()),
                other => EntityValue::Field(other.clone()),
            };
            prop_assert_eq!(entity.get(name), Some(&expected));
        }
    }
}
