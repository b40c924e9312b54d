use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use tracing::info;

use crate::definition::MonitorDefinition;
use crate::factory::create_monitor;
use crate::state::SharedState;

/// Whether a `Content-Type` header names `application/json`, ignoring any
/// `; charset=...`-style parameters.
fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim() == "application/json")
        .unwrap_or(false)
}

pub async fn handle(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if !is_json_content_type(&headers) {
        return (StatusCode::BAD_REQUEST, "bad content type").into_response();
    }

    let body: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let def = match MonitorDefinition::from_value(body.into()) {
        Ok(def) => def,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let monitor = match create_monitor(
        &def,
        &state.plugins,
        Duration::from_secs(state.config.default_interval_secs),
        Duration::from_secs(state.config.default_timeout_secs),
    ) {
        Ok(monitor) => monitor,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let id = match state.monitors.register(Arc::clone(&monitor)) {
        Ok(id) => id,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    info!(monitor_id = id, name = monitor.name(), "new monitor");

    if let Err(e) = monitor.start().await {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    id.to_string().into_response()
}
