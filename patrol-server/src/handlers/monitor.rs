use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::handlers::list::MonitorInfo;
use crate::state::SharedState;

pub async fn get_one(State(state): State<SharedState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.monitors.find(id) {
        Some(monitor) => Json(MonitorInfo::of(&monitor).await).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn post_one(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    body: String,
) -> impl IntoResponse {
    let Some(monitor) = state.monitors.find(id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match body.trim() {
        "start" => match monitor.start().await {
            Ok(()) => StatusCode::OK.into_response(),
            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        },
        "stop" => {
            monitor.stop().await;
            StatusCode::OK.into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "unknown action").into_response(),
    }
}

pub async fn delete_one(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let Some(monitor) = state.monitors.find(id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    monitor.stop().await;
    let _ = state.monitors.unregister(&monitor);
    StatusCode::OK.into_response()
}
