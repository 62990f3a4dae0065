use axum::{extract::State, Json};
use serde::Serialize;

use crate::loader::LibraryReadiness;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub libraries: LibraryReadiness,
    pub history_entries: usize,
}

/// GET /health
/// Liveness plus the two things that gate the workflow: document libraries and history.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    let libraries = state.session.readiness().current();
    let status = match libraries {
        LibraryReadiness::Failed(_) => "degraded",
        _ => "ok",
    };

    Json(HealthStatus {
        status,
        version: env!("CARGO_PKG_VERSION"),
        libraries,
        history_entries: state.session.history().entries().await.len(),
    })
}
