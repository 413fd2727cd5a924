use axum::Json;
use utoipa::OpenApi;

use crate::dto::user_dto::{CreateUserPayload, UpdateUserPayload};
use crate::models::user::User;
use crate::routes;
use crate::utils::validation::FieldViolation;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::users::list_users,
        routes::users::get_user,
        routes::users::create_user,
        routes::users::update_user,
        routes::users::delete_user,
        routes::health::health,
    ),
    components(schemas(User, CreateUserPayload, UpdateUserPayload, FieldViolation)),
    info(title = "User CRUD API")
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
