pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod pricing;
pub mod services;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::AppServices;

/// Shared axum state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
}

/// Standard success envelope for every JSON endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ServiceError>;

/// Builds the versioned API router plus the service-level endpoints.
pub fn app_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        .merge(handlers::funnel::routes())
        .merge(handlers::webhooks::routes())
        .merge(handlers::users::routes())
        .merge(handlers::orders::routes())
        .merge(handlers::subscriptions::routes())
        .merge(handlers::documents::routes())
        .merge(handlers::admin::routes())
        .route("/status", get(status))
        .route("/health", get(health));

    Router::new()
        .route("/", get(root))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .nest("/api/v1", api_v1)
        .with_state(state)
}

async fn root() -> &'static str {
    "Solara API is running"
}

#[derive(Debug, Serialize, ToSchema)]
struct StatusBody {
    status: &'static str,
    version: &'static str,
}

async fn status() -> Json<StatusBody> {
    Json(StatusBody {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness plus a DB round trip.
async fn health(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    state
        .db
        .execute(Statement::from_string(
            state.db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await?;
    Ok(Json(ApiResponse::ok(
        serde_json::json!({ "database": "up" }),
    )))
}
