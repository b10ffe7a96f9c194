use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::order::{self, OrderStatus};
use crate::handlers::Pagination;
use crate::{ApiResponse, ApiResult, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", put(update_status))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
    pub orders: Vec<order::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(Pagination),
    responses(
        (status = 200, description = "Paginated orders, newest first", body = ApiResponse<OrderListResponse>)
    ),
    tag = "orders"
)]
pub(crate) async fn list_orders(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<OrderListResponse> {
    let (orders, total) = state
        .services
        .orders
        .list(pagination.page, pagination.per_page)
        .await?;
    Ok(Json(ApiResponse::ok(OrderListResponse {
        orders,
        total,
        page: pagination.page,
        per_page: pagination.per_page,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = ApiResponse<order::Model>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub(crate) async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<order::Model> {
    let order = state.services.orders.get(id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Back-office status transition along the installation workflow.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<order::Model>),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub(crate) async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<order::Model> {
    let order = state.services.orders.update_status(id, req.status).await?;
    Ok(Json(ApiResponse::ok(order)))
}
