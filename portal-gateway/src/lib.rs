//! HTTP read gateway over live portal subscriptions.
//!
//! Each request opens a subscription, waits for it to settle and returns the
//! resulting state triple as JSON. Errored and empty results stay
//! distinguishable: the body always carries `error`, and the status code
//! reflects it.

mod fixture;

pub use fixture::{Fixture, FixtureError};

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use portal_store::{Direction, Query, StoreError};
use portal_sync::{Subscriber, SubscriptionError, SubscriptionState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// How long a request waits for its subscription to settle.
    pub settle_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            settle_timeout: Duration::from_secs(5),
        }
    }
}

/// JSON body of every read.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StateResponse {
    pub data: serde_json::Value,
    pub loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionParams {
    order_by: Option<String>,
    direction: Option<Direction>,
    limit: Option<usize>,
}

struct GatewayState {
    subscriber: Subscriber,
    config: GatewayConfig,
}

async fn collection_handler(
    State(state): State<Arc<GatewayState>>,
    Path(collection): Path<String>,
    QueryParams(params): QueryParams<CollectionParams>,
) -> Response {
    let mut query = Query::collection(collection);
    if let Some(field) = params.order_by {
        query = query.order_by(field, params.direction.unwrap_or_default());
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    debug!(?query, "collection read");

    let mut subscription = state.subscriber.collection(query);
    let settled = tokio::time::timeout(state.config.settle_timeout, subscription.settled()).await;
    let current = settled.unwrap_or_else(|_| subscription.state());
    respond(current, |entities| {
        serde_json::Value::Array(entities.iter().map(|e| e.to_json()).collect())
    })
}

async fn document_handler(
    State(state): State<Arc<GatewayState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    debug!(%collection, %id, "document read");
    let mut subscription = state.subscriber.document(collection, id);
    let settled = tokio::time::timeout(state.config.settle_timeout, subscription.settled()).await;
    let current = settled.unwrap_or_else(|_| subscription.state());
    respond(current, |entity| {
        entity
            .as_ref()
            .map_or(serde_json::Value::Null, |e| e.to_json())
    })
}

fn respond<T>(state: SubscriptionState<T>, render: impl FnOnce(&T) -> serde_json::Value) -> Response {
    let status = match (&state.error, state.loading) {
        (Some(error), _) => status_for(error),
        (None, true) => StatusCode::GATEWAY_TIMEOUT,
        (None, false) => StatusCode::OK,
    };
    let body = StateResponse {
        data: render(&state.data),
        loading: state.loading,
        error: state.error.as_ref().map(ToString::to_string),
    };
    (status, Json(body)).into_response()
}

fn status_for(error: &SubscriptionError) -> StatusCode {
    match error.store_error() {
        Some(StoreError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
        Some(StoreError::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::SERVICE_UNAVAILABLE,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the HTTP API router over `subscriber`.
pub fn build_router(subscriber: Subscriber, config: GatewayConfig) -> Router {
    let state = Arc::new(GatewayState { subscriber, config });
    Router::new()
        .route("/api/v1/collections/{collection}", get(collection_handler))
        .route("/api/v1/collections/{collection}/{id}", get(document_handler))
        .with_state(state)
}
