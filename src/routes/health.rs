use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store are reachable"),
        (status = 503, description = "Store is unreachable")
    )
)]
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.user_service.backend();
    match state.user_service.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "status": "ok", "store": store })),
        ),
        Err(err) => {
            tracing::warn!(error = %err, store, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "success": false, "status": "unavailable", "store": store })),
            )
        }
    }
}
