use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{plan, subscription};
use crate::{ApiResponse, ApiResult, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions/plans", get(list_plans))
        .route("/subscriptions/create", post(create_subscription))
        .route("/subscriptions/user/{user_id}", get(list_user_subscriptions))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/plans",
    responses(
        (status = 200, description = "Available maintenance plans", body = ApiResponse<Vec<plan::Model>>)
    ),
    tag = "subscriptions"
)]
pub(crate) async fn list_plans(State(state): State<AppState>) -> ApiResult<Vec<plan::Model>> {
    let plans = state.services.subscriptions.list_plans().await?;
    Ok(Json(ApiResponse::ok(plans)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub user_id: Uuid,
    pub plan_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionResponse {
    pub subscription_id: Uuid,
    pub checkout_url: Option<String>,
}

/// Open a hosted checkout for a plan. The subscription stays pending
/// until the provider confirms completion via webhook.
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions/create",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 200, description = "Checkout opened", body = ApiResponse<CreateSubscriptionResponse>),
        (status = 404, description = "User or plan not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment provider unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub(crate) async fn create_subscription(
    State(state): State<AppState>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> ApiResult<CreateSubscriptionResponse> {
    let started = state
        .services
        .subscriptions
        .start_checkout(req.user_id, &req.plan_id)
        .await?;
    Ok(Json(ApiResponse::ok(CreateSubscriptionResponse {
        subscription_id: started.subscription_id,
        checkout_url: started.checkout_url,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/user/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User's subscriptions", body = ApiResponse<Vec<subscription::Model>>)
    ),
    tag = "subscriptions"
)]
pub(crate) async fn list_user_subscriptions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Vec<subscription::Model>> {
    let subs = state.services.subscriptions.list_for_user(user_id).await?;
    Ok(Json(ApiResponse::ok(subs)))
}
