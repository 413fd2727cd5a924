use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Static description of the service.
#[axum::debug_handler]
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "User CRUD API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "listUsers": "GET /api/users",
            "getUser": "GET /api/users?id=<id>",
            "createUser": "POST /api/users",
            "updateUser": "PUT /api/users/:id",
            "deleteUser": "DELETE /api/users/:id",
            "health": "GET /health",
            "openapi": "GET /api-docs/openapi.json",
        },
    }))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Route not found" })),
    )
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "success": false, "message": "Method not allowed" })),
    )
}
