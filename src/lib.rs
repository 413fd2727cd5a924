pub mod config;
pub mod database;
pub mod docs;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::{Config, StoreBackend};
use crate::database::{InMemoryUserRepository, MongoStore, MongoUserRepository, UserRepository};
use crate::error::Result;
use crate::services::user_service::UserService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
}

impl AppState {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self {
            user_service: UserService::new(repo),
        }
    }

    /// Builds the state for the configured store. The Mongo handle is acquired
    /// here once so a bad connection string fails startup instead of the first
    /// request.
    pub async fn init(config: &Config) -> Result<Self> {
        let repo: Arc<dyn UserRepository> = match config.user_store {
            StoreBackend::MongoDb => {
                let store = Arc::new(MongoStore::from_config(config));
                store.acquire().await?;
                tracing::info!(database = store.database_name(), "Using MongoDB user store");
                Arc::new(MongoUserRepository::new(store))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory user store; data is lost on restart");
                Arc::new(InMemoryUserRepository::new())
            }
        };
        Ok(Self::new(repo))
    }
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/", get(routes::root::index))
        .route("/health", get(routes::health::health))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .route(
            "/api/users",
            get(routes::users::list_users)
                .post(routes::users::create_user)
                .fallback(routes::root::method_not_allowed),
        )
        .route(
            "/api/users/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user)
                .fallback(routes::root::method_not_allowed),
        )
        .fallback(routes::root::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(middleware::cors::cors_layer(&config.cors_origins))
        .layer(CatchPanicLayer::custom(middleware::panic::panic_response))
        .layer(TraceLayer::new_for_http())
}
