use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::marketing_lead;
use crate::handlers::Pagination;
use crate::services::reports::SummaryReport;
use crate::{ApiResponse, ApiResult, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/reports/summary", get(summary))
        .route("/admin/leads", get(list_leads))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/reports/summary",
    responses(
        (status = 200, description = "Business summary", body = ApiResponse<SummaryReport>)
    ),
    tag = "admin"
)]
pub(crate) async fn summary(State(state): State<AppState>) -> ApiResult<SummaryReport> {
    let report = state.services.reports.summary().await?;
    Ok(Json(ApiResponse::ok(report)))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadListResponse {
    pub leads: Vec<marketing_lead::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/leads",
    params(Pagination),
    responses(
        (status = 200, description = "Paginated leads, newest first", body = ApiResponse<LeadListResponse>)
    ),
    tag = "admin"
)]
pub(crate) async fn list_leads(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<LeadListResponse> {
    let (leads, total) = state
        .services
        .leads
        .list(pagination.page, pagination.per_page)
        .await?;
    Ok(Json(ApiResponse::ok(LeadListResponse {
        leads,
        total,
        page: pagination.page,
        per_page: pagination.per_page,
    })))
}
