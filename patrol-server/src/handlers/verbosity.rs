use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;

use crate::state::SharedState;

pub async fn get_handle(State(state): State<SharedState>) -> String {
    state.verbosity.get()
}

pub async fn set_handle(State(state): State<SharedState>, body: String) -> impl IntoResponse {
    let level = body.trim();
    match state.verbosity.set(level) {
        Ok(()) => {
            info!(level, "new verbosity");
            StatusCode::OK.into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e).into_response(),
    }
}
