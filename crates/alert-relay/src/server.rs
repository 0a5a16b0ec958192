//! HTTP server for monitoring webhooks.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Alert dispatcher.
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the HTTP router for the relay.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/notify", post(notify_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Webhook body: `{"monitorJSON": {"text": "..."}}`.
#[derive(Debug, Default, Deserialize)]
struct WebhookEnvelope {
    #[serde(rename = "monitorJSON", default)]
    monitor_json: MonitorJson,
}

#[derive(Debug, Default, Deserialize)]
struct MonitorJson {
    #[serde(default)]
    text: String,
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Handle an incoming alert webhook.
///
/// Always acknowledges with success unless the envelope itself is
/// malformed; relay failures are logged by the dispatcher.
async fn notify_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Failed to parse webhook payload");
            return error_response(format!("Invalid JSON payload: {e}"));
        }
    };

    info!(payload = %String::from_utf8_lossy(&body), "Received webhook");

    match state.dispatcher.dispatch(&envelope.monitor_json.text).await {
        Ok(outcome) => {
            debug!(?outcome, "Webhook processed");
            (StatusCode::OK, Json(json!({ "status": "success" })))
        }
        Err(e) => {
            warn!(error = %e, "Rejected webhook");
            error_response(e.to_string())
        }
    }
}

fn error_response(message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "status": "error", "message": message })),
    )
}
