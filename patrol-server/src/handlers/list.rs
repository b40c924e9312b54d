use axum::extract::State;
use axum::Json;
use serde::{Serialize, Serializer};

use crate::state::SharedState;

/// Serialize an id as a JSON string rather than a number, matching the
/// original payload shape.
fn id_as_string<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&id.to_string())
}

/// JSON response shape shared by `/list` and `/monitor/{id}`.
#[derive(Serialize)]
pub struct MonitorInfo {
    #[serde(serialize_with = "id_as_string")]
    pub id: i64,
    pub name: String,
    pub running: bool,
    pub failing: bool,
}

impl MonitorInfo {
    pub async fn of(monitor: &patrol_monitor::Monitor) -> Self {
        Self {
            id: monitor.id(),
            name: monitor.name().to_owned(),
            running: monitor.running().await,
            failing: monitor.failing(),
        }
    }
}

pub async fn handle(State(state): State<SharedState>) -> Json<Vec<MonitorInfo>> {
    let mut infos = Vec::new();
    for monitor in state.monitors.list() {
        infos.push(MonitorInfo::of(&monitor).await);
    }
    Json(infos)
}
