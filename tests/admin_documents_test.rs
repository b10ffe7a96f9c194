mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{expect_json, TestApp};
use serde_json::json;

fn multipart_body(boundary: &str, user_id: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\ncontent-disposition: form-data; name=\"docType\"\r\n\r\nelectricity_bill\r\n\
             --{b}\r\ncontent-disposition: form-data; name=\"userId\"\r\n\r\n{u}\r\n\
             --{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"bill.pdf\"\r\n\
             content-type: application/pdf\r\n\r\n",
            b = boundary,
            u = user_id
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"%PDF-1.4 fake bytes");
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[tokio::test]
async fn document_upload_and_review_flow() {
    let app = TestApp::spawn().await;

    let user = expect_json(
        app.post_json(
            "/api/v1/users",
            json!({"email": "docs@example.com", "name": "Doc Uploader"}),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let user_id = user["data"]["id"].as_str().unwrap().to_string();

    let boundary = "solara-test-boundary";
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/documents/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart_body(boundary, &user_id)))
        .unwrap();
    let body = expect_json(app.request(req).await, StatusCode::OK).await;
    let doc = &body["data"];
    assert_eq!(doc["status"], json!("pending"));
    assert_eq!(doc["doc_type"], json!("electricity_bill"));
    let doc_id = doc["id"].as_str().unwrap().to_string();

    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/v1/documents/{}/approve", doc_id))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"approved": true, "reviewedBy": "ops@solara"}).to_string(),
        ))
        .unwrap();
    let body = expect_json(app.request(req).await, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], json!("approved"));
    assert_eq!(body["data"]["reviewed_by"], json!("ops@solara"));

    let body = expect_json(
        app.get(&format!("/api/v1/documents/user/{}", user_id)).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn summary_report_counts_everything() {
    let app = TestApp::spawn().await;

    // One lead, one user, one order via the webhook path.
    let response = app
        .post_json(
            "/api/v1/funnel/lead",
            json!({"phone": "9876543210", "pincode": "560001"}),
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    let session_id = body["data"]["sessionId"].as_str().unwrap().to_string();

    app.post_json(
        "/api/v1/funnel/update-session",
        json!({"sessionId": session_id, "updateType": "PLAN_UPDATE", "data": {"systemType": "basic_4kw"}}),
    )
    .await;
    let body = expect_json(
        app.post_json(
            "/api/v1/funnel/create-payment",
            json!({"sessionId": session_id}),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let intent_id = body["data"]["paymentIntentId"].as_str().unwrap().to_string();
    expect_json(
        app.post_json(
            "/api/v1/funnel/verify-payment",
            json!({"sessionId": session_id, "paymentIntentId": intent_id}),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    let body = expect_json(
        app.get("/api/v1/admin/reports/summary").await,
        StatusCode::OK,
    )
    .await;
    let data = &body["data"];
    assert_eq!(data["totalLeads"], json!(1));
    assert_eq!(data["totalUsers"], json!(1));
    assert_eq!(data["totalOrders"], json!(1));
    assert_eq!(data["activeSubscriptions"], json!(0));
    assert_eq!(data["recentOrders"].as_array().unwrap().len(), 1);
    // 12000 * 1.05
    let revenue: rust_decimal::Decimal = data["totalRevenue"].as_str().unwrap().parse().unwrap();
    assert_eq!(revenue, rust_decimal_macros::dec!(12600));
}

#[tokio::test]
async fn leads_listing_paginates() {
    let app = TestApp::spawn().await;

    for i in 0..3 {
        app.post_json(
            "/api/v1/funnel/lead",
            json!({"phone": format!("900000000{}", i), "pincode": "560001"}),
        )
        .await;
    }

    let body = expect_json(
        app.get("/api/v1/admin/leads?page=1&perPage=2").await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["total"], json!(3));
    assert_eq!(body["data"]["leads"].as_array().unwrap().len(), 2);

    let body = expect_json(
        app.get("/api/v1/admin/leads?page=2&perPage=2").await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["leads"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_and_status_respond() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/v1/status").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = expect_json(app.get("/api/v1/health").await, StatusCode::OK).await;
    assert_eq!(body["data"]["database"], json!("up"));

    let response = app.get("/api-docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);
}
