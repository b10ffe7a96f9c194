use axum::Json;
use utoipa::OpenApi;

use crate::handlers;

/// Merged API document, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Solara API",
        description = "Solar installation booking funnel, orders, subscriptions and documents",
        license(name = "MIT")
    ),
    paths(
        handlers::funnel::capture_lead,
        handlers::funnel::update_session,
        handlers::funnel::create_payment,
        handlers::funnel::verify_payment,
        handlers::funnel::upload_url,
        handlers::funnel::upload_file,
        handlers::webhooks::receive_webhook,
        handlers::users::upsert_user,
        handlers::users::get_user,
        handlers::users::get_user_orders,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_status,
        handlers::subscriptions::list_plans,
        handlers::subscriptions::create_subscription,
        handlers::subscriptions::list_user_subscriptions,
        handlers::documents::upload_document,
        handlers::documents::list_user_documents,
        handlers::documents::review_document,
        handlers::admin::summary,
        handlers::admin::list_leads,
    ),
    tags(
        (name = "funnel", description = "Lead capture, quoting and checkout"),
        (name = "webhooks", description = "Payment provider callbacks"),
        (name = "users", description = "Customer accounts"),
        (name = "orders", description = "Installation orders"),
        (name = "subscriptions", description = "Maintenance plans"),
        (name = "documents", description = "Document uploads and review"),
        (name = "admin", description = "Back-office reporting")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_contains_core_paths() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        let paths = json["paths"].as_object().unwrap();
        assert!(paths.contains_key("/api/v1/funnel/lead"));
        assert!(paths.contains_key("/api/v1/funnel/update-session"));
        assert!(paths.contains_key("/api/v1/stripe/webhook"));
        assert!(paths.contains_key("/api/v1/orders/{id}/status"));
    }
}
