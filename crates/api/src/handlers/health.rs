//! Health check endpoint

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::state::AppState;

/// Liveness plus a database ping, in the shape the dashboard expects.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let connected = state.db.ping().await.is_ok();
    Json(serde_json::json!({
        "status": if connected { "OK" } else { "DEGRADED" },
        "database": {
            "status": if connected { "connected" } else { "unreachable" },
            "connected": connected,
        }
    }))
}
