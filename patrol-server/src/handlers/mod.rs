pub mod list;
pub mod monitor;
pub mod register;
pub mod verbosity;
pub mod version;

use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::timeout::TimeoutLayer;

use patrol_plugin::metrics::track_metrics;

use crate::state::SharedState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The full REST control plane: the `/list`, `/register`, `/monitor/{id}`,
/// `/version`, `/verbosity` routes plus the ambient `/metrics` endpoint,
/// sharing one listener, one timeout policy, and one request-metrics
/// middleware.
pub fn app(state: SharedState) -> Router {
    Router::new()
        .route("/list", get(list::handle))
        .route("/register", post(register::handle))
        .route(
            "/monitor/:id",
            get(monitor::get_one)
                .post(monitor::post_one)
                .delete(monitor::delete_one),
        )
        .route("/version", get(version::handle))
        .route(
            "/verbosity",
            get(verbosity::get_handle)
                .put(verbosity::set_handle)
                .post(verbosity::set_handle),
        )
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

async fn metrics_handler(State(state): State<SharedState>) -> String {
    state.metrics_handle.render()
}
