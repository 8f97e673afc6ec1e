//! HTTP surface for watch requests.
//!
//! `POST /watch` answers with the topic immediately and starts the watch in
//! the background. The caller never learns whether resolution or the watch
//! start succeeded; those outcomes only show up in the logs.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::request::WatchRequest;
use crate::server::AppState;

/// Body of a successful `POST /watch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchResponse {
    /// Topic the events will be published on
    pub nats_topic: String,
}

/// Route table for the gateway.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/watch", post(watch).fallback(method_not_allowed))
        .route("/healthz", get(healthz))
}

async fn watch(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match WatchRequest::from_json(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected watch request: {}", e);
            return (StatusCode::BAD_REQUEST, format!("Invalid request payload: {e}")).into_response();
        }
    };

    let topic = request.topic();
    info!("Accepted watch request, events will be published to {}", topic);

    let service = Arc::clone(&state.watcher);
    tokio::spawn(async move {
        if let Err(e) = service.watch(request).await {
            error!("Watch failed: {}", e);
        }
    });

    (StatusCode::ACCEPTED, Json(WatchResponse { nats_topic: topic })).into_response()
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Only POST requests are allowed")
}

async fn healthz() -> &'static str {
    "ok"
}
