use axum::extract::{Multipart, Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::document;
use crate::errors::ServiceError;
use crate::{ApiResponse, ApiResult, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents/upload", post(upload_document))
        .route("/documents/user/{user_id}", get(list_user_documents))
        .route("/documents/{id}/approve", patch(review_document))
}

/// Multipart upload: a `file` part plus `docType` and optional `userId`
/// and `orderId` fields.
#[utoipa::path(
    post,
    path = "/api/v1/documents/upload",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document stored, pending review", body = ApiResponse<document::Model>),
        (status = 400, description = "Missing file or docType", body = crate::errors::ErrorResponse)
    ),
    tag = "documents"
)]
pub(crate) async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<document::Model> {
    let mut doc_type: Option<String> = None;
    let mut user_id: Option<Uuid> = None;
    let mut order_id: Option<Uuid> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "docType" => {
                doc_type = Some(read_text(field).await?);
            }
            "userId" => {
                user_id = Some(parse_uuid(&read_text(field).await?, "userId")?);
            }
            "orderId" => {
                order_id = Some(parse_uuid(&read_text(field).await?, "orderId")?);
            }
            "file" => {
                let file_name = field
                    .file_name()
                    .unwrap_or("upload")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ServiceError::BadRequest(format!("Failed to read file part: {}", e))
                })?;
                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let doc_type = doc_type
        .ok_or_else(|| ServiceError::ValidationError("docType is required".to_string()))?;
    let (file_name, bytes) =
        file.ok_or_else(|| ServiceError::ValidationError("file part is required".to_string()))?;

    let saved = state
        .services
        .documents
        .upload(user_id, order_id, &doc_type, &file_name, &bytes)
        .await?;
    Ok(Json(ApiResponse::ok(saved)))
}

pub(crate) async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ServiceError> {
    field
        .text()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("Malformed multipart field: {}", e)))
}

fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::ValidationError(format!("{} must be a UUID", field)))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/user/{user_id}",
    params(("user_id" = Uuid, Path, description = "Owner user id")),
    responses(
        (status = 200, description = "User's documents", body = ApiResponse<Vec<document::Model>>)
    ),
    tag = "documents"
)]
pub(crate) async fn list_user_documents(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Vec<document::Model>> {
    let docs = state.services.documents.list_for_user(user_id).await?;
    Ok(Json(ApiResponse::ok(docs)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDocumentRequest {
    pub approved: bool,
    pub reviewed_by: String,
}

#[utoipa::path(
    patch,
    path = "/api/v1/documents/{id}/approve",
    params(("id" = Uuid, Path, description = "Document id")),
    request_body = ReviewDocumentRequest,
    responses(
        (status = 200, description = "Review recorded", body = ApiResponse<document::Model>),
        (status = 404, description = "Document not found", body = crate::errors::ErrorResponse)
    ),
    tag = "documents"
)]
pub(crate) async fn review_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewDocumentRequest>,
) -> ApiResult<document::Model> {
    let doc = state
        .services
        .documents
        .review(id, req.approved, &req.reviewed_by)
        .await?;
    Ok(Json(ApiResponse::ok(doc)))
}
