use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::entities::{order, user};
use crate::services::users::UpsertUserRequest;
use crate::{ApiResponse, ApiResult, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(upsert_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/orders", get(get_user_orders))
}

/// Create or update a user by email.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = UpsertUserRequest,
    responses(
        (status = 200, description = "User created or updated", body = ApiResponse<user::Model>),
        (status = 400, description = "Invalid email", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub(crate) async fn upsert_user(
    State(state): State<AppState>,
    Json(req): Json<UpsertUserRequest>,
) -> ApiResult<user::Model> {
    let user = state.services.users.upsert(req).await?;
    Ok(Json(ApiResponse::ok(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = ApiResponse<user::Model>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub(crate) async fn get_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<user::Model> {
    let user = state.services.users.get(id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/orders",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User's orders, newest first", body = ApiResponse<Vec<order::Model>>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub(crate) async fn get_user_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<order::Model>> {
    // 404 for a missing user rather than an empty list.
    state.services.users.get(id).await?;
    let orders = state.services.orders.list_for_user(id).await?;
    Ok(Json(ApiResponse::ok(orders)))
}
