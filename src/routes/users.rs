use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::Value;

use crate::{
    dto::user_dto::{ApiResponse, CreateUserPayload, UpdateUserPayload, UserListQuery},
    error::{Error, Result},
    AppState,
};

fn json_body(payload: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(Error::PayloadTooLarge)
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected request body");
            Err(Error::BadRequest("Invalid JSON payload".to_string()))
        }
    }
}

fn list_query(
    query: std::result::Result<Query<UserListQuery>, QueryRejection>,
) -> Result<UserListQuery> {
    query.map(|Query(query)| query).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected query string");
        Error::BadRequest("Invalid query string".to_string())
    })
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("id" = Option<String>, Query, description = "Fetch a single user by ID")
    ),
    responses(
        (status = 200, description = "All users, newest first, or the requested user"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    query: std::result::Result<Query<UserListQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let query = list_query(query)?;
    if let Some(id) = query.id() {
        let user = state.user_service.get(id).await?;
        return Ok(Json(ApiResponse::data(user)).into_response());
    }

    let users = state.user_service.list().await?;
    Ok(Json(ApiResponse::list(users)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = crate::models::user::User),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get(&id).await?;
    Ok(Json(ApiResponse::data(user)))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "User created successfully", body = crate::models::user::User),
        (status = 400, description = "Validation error or email already exists")
    )
)]
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let payload = CreateUserPayload::from_json(&json_body(payload)?)?;
    let user = state.user_service.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("User created successfully", user)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "User updated successfully", body = crate::models::user::User),
        (status = 400, description = "Validation error or email in use"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let payload = UpdateUserPayload::from_json(&json_body(payload)?)?;
    let user = state.user_service.update(&id, payload).await?;
    Ok(Json(ApiResponse::with_message("User updated successfully", user)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = crate::models::user::User),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.delete(&id).await?;
    Ok(Json(ApiResponse::with_message("User deleted successfully", user)))
}
