use async_trait::async_trait;
use portal_gateway::{build_router, GatewayConfig, StateResponse};
use portal_model::{FieldValue, RawRecord};
use portal_store::{
    DocumentSnapshot, DocumentStore, Listener, ListenerRegistration, MemoryStore, Query,
    QuerySnapshot, StoreError, StoreResult,
};
use portal_sync::Subscriber;
use portal_types::{DocumentId, StoreTimestamp};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
async fn spawn_server(store: Arc<dyn DocumentStore>, config: GatewayConfig) -> String {
    let app = build_router(Subscriber::new(store), config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

async fn spawn_memory_server(store: &MemoryStore) -> String {
    spawn_server(Arc::new(store.clone()), GatewayConfig::default()).await
}

fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    store.set(
        "projects",
        "p1",
        RawRecord::new().with("title", "Alpha").with("priority", 2i64),
    );
    store.set(
        "projects",
        "p2",
        RawRecord::new().with("title", "Beta").with("priority", 1i64),
    );
    store.set(
        "users",
        "abc123",
        RawRecord::new()
            .with("name", "Jane")
            .with("lastLogin", StoreTimestamp::new(1_704_448_800, 0)),
    );
    store
}

async fn get(url: String) -> (u16, StateResponse) {
    let resp = reqwest::get(url).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

// ── Collection reads ─────────────────────────────────────────────

#[tokio::test]
async fn collection_read_returns_settled_entities() {
    let base = spawn_memory_server(&seeded()).await;
    let (status, body) = get(format!("{}/api/v1/collections/users", base)).await;

    assert_eq!(status, 200);
    assert!(!body.loading);
    assert_eq!(body.error, None);
    assert_eq!(
        body.data,
        json!([{ "uid": "abc123", "name": "Jane", "lastLogin": "2024-01-05T10:00:00Z" }])
    );
}

#[tokio::test]
async fn collection_read_uses_id_key_outside_users() {
    let base = spawn_memory_server(&seeded()).await;
    let (_, body) = get(format!("{}/api/v1/collections/projects", base)).await;

    let ids: Vec<&str> = body
        .data
        .as_array()
        .unwrap()
        .iter()
        .map(|entity| entity["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p1", "p2"]);
}

#[tokio::test]
async fn collection_read_applies_order_and_limit() {
    let base = spawn_memory_server(&seeded()).await;
    let (status, body) = get(format!(
        "{}/api/v1/collections/projects?orderBy=priority&direction=asc&limit=1",
        base
    ))
    .await;

    assert_eq!(status, 200);
    assert_eq!(body.data, json!([{ "id": "p2", "title": "Beta", "priority": 1 }]));
}

#[tokio::test]
async fn empty_collection_is_ok_and_empty() {
    let base = spawn_memory_server(&MemoryStore::new()).await;
    let (status, body) = get(format!("{}/api/v1/collections/wiki", base)).await;

    assert_eq!(status, 200);
    assert_eq!(body.data, json!([]));
    assert_eq!(body.error, None);
}

#[tokio::test]
async fn content_type_is_json() {
    let base = spawn_memory_server(&seeded()).await;
    let resp = reqwest::get(format!("{}/api/v1/collections/projects", base))
        .await
        .unwrap();

    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.contains("application/json"));
}

// ── Document reads ───────────────────────────────────────────────

#[tokio::test]
async fn document_read_returns_entity() {
    let base = spawn_memory_server(&seeded()).await;
    let (status, body) = get(format!("{}/api/v1/collections/projects/p1", base)).await;

    assert_eq!(status, 200);
    assert_eq!(body.data, json!({ "id": "p1", "title": "Alpha", "priority": 2 }));
}

#[tokio::test]
async fn missing_document_is_null_without_error() {
    let base = spawn_memory_server(&seeded()).await;
    let (status, body) = get(format!("{}/api/v1/collections/projects/nope", base)).await;

    assert_eq!(status, 200);
    assert_eq!(body.data, serde_json::Value::Null);
    assert_eq!(body.error, None);
    assert!(!body.loading);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let base = spawn_memory_server(&seeded()).await;
    let resp = reqwest::get(format!("{}/api/v1/nonexistent", base))
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

// ── Error mapping ────────────────────────────────────────────────

#[tokio::test]
async fn permission_denied_maps_to_403() {
    let store = seeded();
    store.reject_listens(Some(StoreError::PermissionDenied("contracts".into())));
    let base = spawn_memory_server(&store).await;
    let (status, body) = get(format!("{}/api/v1/collections/contracts", base)).await;

    assert_eq!(status, 403);
    assert!(!body.loading);
    assert_eq!(body.data, json!([]));
    assert!(body.error.unwrap().contains("permission denied"));
}

#[tokio::test]
async fn unavailable_store_maps_to_503() {
    let store = seeded();
    store.reject_listens(Some(StoreError::Unavailable("offline".into())));
    let base = spawn_memory_server(&store).await;
    let (status, body) = get(format!("{}/api/v1/collections/projects/p1", base)).await;

    assert_eq!(status, 503);
    assert_eq!(body.data, serde_json::Value::Null);
    assert!(body.error.is_some());
}

#[tokio::test]
async fn bad_timestamp_maps_to_500() {
    let store = MemoryStore::new();
    store.set(
        "users",
        "u1",
        RawRecord::new().with(
            "lastLogin",
            FieldValue::Timestamp(StoreTimestamp::new(0, 2_000_000_000)),
        ),
    );
    let base = spawn_memory_server(&store).await;
    let (status, body) = get(format!("{}/api/v1/collections/users", base)).await;

    assert_eq!(status, 500);
    assert!(body.error.is_some());
}

// ── Settle timeout ───────────────────────────────────────────────

/// A store whose listeners open but never emit.
#[derive(Default)]
struct SilentStore {
    collection_senders: Mutex<Vec<mpsc::UnboundedSender<StoreResult<QuerySnapshot>>>>,
    document_senders: Mutex<Vec<mpsc::UnboundedSender<StoreResult<DocumentSnapshot>>>>,
}

struct NoopRegistration;

impl ListenerRegistration for NoopRegistration {
    fn remove(&mut self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SilentStore {
    async fn listen_collection(&self, _query: &Query) -> StoreResult<Listener<QuerySnapshot>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.collection_senders.lock().unwrap().push(tx);
        Ok(Listener::new(rx, NoopRegistration))
    }

    async fn listen_document(
        &self,
        _collection: &str,
        _id: &DocumentId,
    ) -> StoreResult<Listener<DocumentSnapshot>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.document_senders.lock().unwrap().push(tx);
        Ok(Listener::new(rx, NoopRegistration))
    }
}

#[tokio::test]
async fn unsettled_read_times_out_with_504() {
    let config = GatewayConfig {
        settle_timeout: Duration::from_millis(50),
    };
    let base = spawn_server(Arc::new(SilentStore::default()), config).await;
    let (status, body) = get(format!("{}/api/v1/collections/projects", base)).await;

    assert_eq!(status, 504);
    assert!(body.loading);
    assert_eq!(body.data, json!([]));
    assert_eq!(body.error, None);
}
