mod common;

use axum::http::StatusCode;
use common::{expect_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

/// Money fields serialize as decimal strings; the stored scale varies by
/// backend, so compare values, not text.
fn dec_field(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {}", value))
        .parse()
        .unwrap()
}

async fn open_session(app: &TestApp) -> String {
    let response = app
        .post_json(
            "/api/v1/funnel/lead",
            json!({"phone": "9876543210", "pincode": "560001", "source": "landing_page"}),
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["success"], json!(true));
    body["data"]["sessionId"].as_str().unwrap().to_string()
}

async fn update(app: &TestApp, session_id: &str, update_type: &str, data: serde_json::Value) -> serde_json::Value {
    let response = app
        .post_json(
            "/api/v1/funnel/update-session",
            json!({"sessionId": session_id, "updateType": update_type, "data": data}),
        )
        .await;
    expect_json(response, StatusCode::OK).await
}

#[tokio::test]
async fn lead_capture_validates_pincode() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/v1/funnel/lead",
            json!({"phone": "9876543210", "pincode": "12"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_json(
            "/api/v1/funnel/lead",
            json!({"phone": "9876543210", "pincode": "56000X"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quote_matches_standard_elevated_fixture() {
    let app = TestApp::spawn().await;
    let session_id = open_session(&app).await;

    update(&app, &session_id, "PLAN_UPDATE", json!({"systemType": "standard_8kw"})).await;
    let body = update(
        &app,
        &session_id,
        "STRUCTURE_UPDATE",
        json!({"structureType": "elevated"}),
    )
    .await;

    let data = &body["data"];
    assert_eq!(dec_field(&data["totalSystemCost"]), dec!(18000));
    assert_eq!(dec_field(&data["gstAmount"]), dec!(900));
    assert_eq!(dec_field(&data["finalTotal"]), dec!(18900));
    assert_eq!(dec_field(&data["monthlyEmi"]), dec!(315));
    assert_eq!(data["currency"], json!("INR"));
}

#[tokio::test]
async fn update_types_do_not_clobber_each_other() {
    let app = TestApp::spawn().await;
    let session_id = open_session(&app).await;

    update(&app, &session_id, "PLAN_UPDATE", json!({"systemType": "premium_12kw"})).await;
    update(
        &app,
        &session_id,
        "HARDWARE_UPDATE",
        json!({"panelBrand": "Helios", "inverterBrand": "VoltEdge"}),
    )
    .await;
    update(
        &app,
        &session_id,
        "STRUCTURE_UPDATE",
        json!({"structureType": "high_rise"}),
    )
    .await;
    // Partial hardware update touches only the supplied field.
    let body = update(
        &app,
        &session_id,
        "HARDWARE_UPDATE",
        json!({"panelTechnology": "topcon"}),
    )
    .await;

    let data = &body["data"];
    assert_eq!(data["systemType"], json!("premium_12kw"));
    assert_eq!(data["kwSize"], json!(12));
    assert_eq!(data["structureType"], json!("high_rise"));
    assert_eq!(data["panelBrand"], json!("Helios"));
    assert_eq!(data["inverterBrand"], json!("VoltEdge"));
    assert_eq!(data["panelTechnology"], json!("topcon"));
    // 26000 + 1500, taxed at 5%.
    assert_eq!(dec_field(&data["finalTotal"]), dec!(28875));
}

#[tokio::test]
async fn unknown_plan_and_structure_are_rejected() {
    let app = TestApp::spawn().await;
    let session_id = open_session(&app).await;

    let response = app
        .post_json(
            "/api/v1/funnel/update-session",
            json!({"sessionId": session_id, "updateType": "PLAN_UPDATE", "data": {"systemType": "mega_99kw"}}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_json(
            "/api/v1/funnel/update-session",
            json!({"sessionId": session_id, "updateType": "STRUCTURE_UPDATE", "data": {"structureType": "underwater"}}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn doc_upload_upserts_by_doc_type() {
    let app = TestApp::spawn().await;
    let session_id = open_session(&app).await;

    update(
        &app,
        &session_id,
        "DOC_UPLOAD",
        json!({"docType": "electricity_bill", "fileKey": "uploads/a/v1.pdf"}),
    )
    .await;
    update(
        &app,
        &session_id,
        "DOC_UPLOAD",
        json!({"docType": "identity_proof", "fileKey": "uploads/a/id.pdf"}),
    )
    .await;
    let body = update(
        &app,
        &session_id,
        "DOC_UPLOAD",
        json!({"docType": "electricity_bill", "fileKey": "uploads/a/v2.pdf"}),
    )
    .await;

    let docs = body["data"]["documents"].as_array().unwrap();
    assert_eq!(docs.len(), 2);
    let bill = docs
        .iter()
        .find(|d| d["docType"] == json!("electricity_bill"))
        .unwrap();
    assert_eq!(bill["fileKey"], json!("uploads/a/v2.pdf"));
}

#[tokio::test]
async fn fetch_creates_session_on_first_use() {
    let app = TestApp::spawn().await;

    // FETCH carries no data payload.
    let response = app
        .post_json(
            "/api/v1/funnel/update-session",
            json!({"sessionId": "fs_fresh_client_id", "updateType": "FETCH"}),
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    let data = &body["data"];
    assert_eq!(data["sessionId"], json!("fs_fresh_client_id"));
    assert_eq!(data["status"], json!("active"));
    assert!(data["systemType"].is_null());
}

#[tokio::test]
async fn upload_url_then_put_stores_the_file() {
    let app = TestApp::spawn().await;
    let session_id = open_session(&app).await;

    let response = app
        .get(&format!(
            "/api/v1/funnel/upload-url?sessionId={}&fileName=bill.pdf&fileType=application/pdf",
            session_id
        ))
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    let key = body["data"]["key"].as_str().unwrap().to_string();
    assert!(key.starts_with(&format!("uploads/{}/", session_id)));
    assert!(body["data"]["uploadUrl"]
        .as_str()
        .unwrap()
        .contains("/api/v1/funnel/upload/"));

    let put = axum::http::Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/funnel/upload/{}", key))
        .body(axum::body::Body::from("pdf-bytes"))
        .unwrap();
    let response = app.request(put).await;
    assert_eq!(response.status(), StatusCode::OK);
}
