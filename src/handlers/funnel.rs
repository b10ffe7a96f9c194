use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::services::funnel::{SessionUpdate, SessionView};
use crate::{ApiResponse, ApiResult, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/funnel/lead", post(capture_lead))
        .route("/funnel/update-session", post(update_session))
        .route("/funnel/create-payment", post(create_payment))
        .route("/funnel/verify-payment", post(verify_payment))
        .route("/funnel/upload-url", get(upload_url))
        .route("/funnel/upload/{*key}", put(upload_file))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadCapturedResponse {
    pub session_id: String,
}

/// Capture a marketing lead and open a funnel session.
#[utoipa::path(
    post,
    path = "/api/v1/funnel/lead",
    request_body = crate::services::leads::CaptureLeadRequest,
    responses(
        (status = 200, description = "Lead captured", body = ApiResponse<LeadCapturedResponse>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse)
    ),
    tag = "funnel"
)]
pub(crate) async fn capture_lead(
    State(state): State<AppState>,
    Json(req): Json<crate::services::leads::CaptureLeadRequest>,
) -> ApiResult<LeadCapturedResponse> {
    let lead = state.services.leads.capture(req).await?;
    Ok(Json(ApiResponse::ok(LeadCapturedResponse {
        session_id: lead.session_id,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    pub session_id: String,
    #[serde(flatten)]
    pub update: SessionUpdate,
}

/// Apply one update to a funnel session and return the refreshed state.
#[utoipa::path(
    post,
    path = "/api/v1/funnel/update-session",
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "Session state after the update", body = ApiResponse<SessionView>),
        (status = 400, description = "Unknown plan/structure or bad update", body = crate::errors::ErrorResponse),
        (status = 409, description = "Session already converted", body = crate::errors::ErrorResponse)
    ),
    tag = "funnel"
)]
pub(crate) async fn update_session(
    State(state): State<AppState>,
    Json(req): Json<UpdateSessionRequest>,
) -> ApiResult<SessionView> {
    let view = state
        .services
        .funnel
        .apply_update(&req.session_id, req.update)
        .await?;
    Ok(Json(ApiResponse::ok(view)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
}

/// Create a payment intent for the session's quoted total.
#[utoipa::path(
    post,
    path = "/api/v1/funnel/create-payment",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = ApiResponse<CreatePaymentResponse>),
        (status = 400, description = "Session has no quote", body = crate::errors::ErrorResponse),
        (status = 404, description = "Session not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment provider unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "funnel"
)]
pub(crate) async fn create_payment(
    State(state): State<AppState>,
    Json(req): Json<CreatePaymentRequest>,
) -> ApiResult<CreatePaymentResponse> {
    let intent = state
        .services
        .checkout
        .create_payment(&req.session_id)
        .await?;
    Ok(Json(ApiResponse::ok(CreatePaymentResponse {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub session_id: String,
    pub payment_intent_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub order_id: String,
    pub user_id: uuid::Uuid,
    pub amount: rust_decimal::Decimal,
}

/// Confirm a payment with the provider and migrate the session to an order.
#[utoipa::path(
    post,
    path = "/api/v1/funnel/verify-payment",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Order created (or already existed)", body = ApiResponse<VerifyPaymentResponse>),
        (status = 402, description = "Payment not succeeded", body = crate::errors::ErrorResponse),
        (status = 404, description = "Session not found", body = crate::errors::ErrorResponse)
    ),
    tag = "funnel"
)]
pub(crate) async fn verify_payment(
    State(state): State<AppState>,
    Json(req): Json<VerifyPaymentRequest>,
) -> ApiResult<VerifyPaymentResponse> {
    let outcome = state
        .services
        .checkout
        .verify_payment(&req.session_id, &req.payment_intent_id, req.email)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(
        VerifyPaymentResponse {
            order_id: outcome.order_number,
            user_id: outcome.user_id,
            amount: outcome.amount,
        },
        "Payment verified",
    )))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlParams {
    pub session_id: String,
    pub file_name: String,
    #[allow(dead_code)]
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub key: String,
}

/// Issue a PUT target for a funnel document upload.
#[utoipa::path(
    get,
    path = "/api/v1/funnel/upload-url",
    params(UploadUrlParams),
    responses(
        (status = 200, description = "Upload target", body = ApiResponse<UploadUrlResponse>),
        (status = 400, description = "Missing parameters", body = crate::errors::ErrorResponse)
    ),
    tag = "funnel"
)]
pub(crate) async fn upload_url(
    State(state): State<AppState>,
    Query(params): Query<UploadUrlParams>,
) -> ApiResult<UploadUrlResponse> {
    let base = state.config.public_base_url();
    let (upload_url, key) = state.services.documents.upload_target(
        &base,
        &params.session_id,
        &params.file_name,
    )?;
    Ok(Json(ApiResponse::ok(UploadUrlResponse { upload_url, key })))
}

/// Store a raw document body under an issued key.
#[utoipa::path(
    put,
    path = "/api/v1/funnel/upload/{key}",
    params(("key" = String, Path, description = "Storage key issued by upload-url")),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Stored", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Empty body or bad key", body = crate::errors::ErrorResponse)
    ),
    tag = "funnel"
)]
pub(crate) async fn upload_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> ApiResult<serde_json::Value> {
    state.services.documents.store_raw(&key, &body).await?;
    Ok(Json(ApiResponse::ok(serde_json::json!({ "key": key }))))
}
