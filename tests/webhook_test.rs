mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use common::{expect_json, json_body, TestApp, WEBHOOK_SECRET};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use solara_api::entities::subscription::SubscriptionStatus;
use solara_api::entities::{Order, Payment, Subscription};
use solara_api::handlers::webhooks::sign_payload;

async fn paid_session(app: &TestApp) -> (String, String) {
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
        json!({"sessionId": session_id, "updateType": "PLAN_UPDATE", "data": {"systemType": "standard_8kw"}}),
    )
    .await;

    let response = app
        .post_json(
            "/api/v1/funnel/create-payment",
            json!({"sessionId": session_id}),
        )
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    let intent_id = body["data"]["paymentIntentId"].as_str().unwrap().to_string();
    (session_id, intent_id)
}

fn intent_event(session_id: &str, intent_id: &str) -> serde_json::Value {
    json!({
        "id": "evt_test_1",
        "type": "payment_intent.succeeded",
        "data": {"object": {
            "id": intent_id,
            "metadata": {"session_id": session_id}
        }}
    })
}

#[tokio::test]
async fn invalid_signature_is_rejected_with_no_writes() {
    let app = TestApp::spawn().await;
    let (session_id, intent_id) = paid_session(&app).await;
    let payload = intent_event(&session_id, &intent_id).to_string();

    // Wrong secret.
    let signature = sign_payload("whsec_wrong", payload.as_bytes(), Utc::now().timestamp());
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/stripe/webhook")
        .header("Stripe-Signature", signature)
        .body(Body::from(payload.clone()))
        .unwrap();
    assert_eq!(app.request(req).await.status(), StatusCode::BAD_REQUEST);

    // Missing header.
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/stripe/webhook")
        .body(Body::from(payload.clone()))
        .unwrap();
    assert_eq!(app.request(req).await.status(), StatusCode::BAD_REQUEST);

    // Stale timestamp.
    let signature = sign_payload(
        WEBHOOK_SECRET,
        payload.as_bytes(),
        Utc::now().timestamp() - 3600,
    );
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/stripe/webhook")
        .header("Stripe-Signature", signature)
        .body(Body::from(payload))
        .unwrap();
    assert_eq!(app.request(req).await.status(), StatusCode::BAD_REQUEST);

    assert_eq!(Order::find().count(&*app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn payment_intent_succeeded_creates_the_order() {
    let app = TestApp::spawn().await;
    let (session_id, intent_id) = paid_session(&app).await;

    let response = app.post_webhook(&intent_event(&session_id, &intent_id)).await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body, json!({"received": true}));

    assert_eq!(Order::find().count(&*app.db).await.unwrap(), 1);
    let order = Order::find().one(&*app.db).await.unwrap().unwrap();
    assert_eq!(order.payment_intent_id.as_deref(), Some(intent_id.as_str()));
    // The lead's phone became the order's customer.
    assert!(order.order_number.starts_with("SOL-"));
}

#[tokio::test]
async fn webhook_replay_does_not_duplicate_the_order() {
    let app = TestApp::spawn().await;
    let (session_id, intent_id) = paid_session(&app).await;
    let event = intent_event(&session_id, &intent_id);

    app.post_webhook(&event).await;
    let response = app.post_webhook(&event).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(Order::find().count(&*app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn webhook_and_client_verify_race_safely() {
    let app = TestApp::spawn().await;
    let (session_id, intent_id) = paid_session(&app).await;

    app.post_webhook(&intent_event(&session_id, &intent_id)).await;
    let body = expect_json(
        app.post_json(
            "/api/v1/funnel/verify-payment",
            json!({"sessionId": session_id, "paymentIntentId": intent_id}),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    let order = Order::find().one(&*app.db).await.unwrap().unwrap();
    assert_eq!(
        body["data"]["orderId"].as_str().unwrap(),
        order.order_number
    );
    assert_eq!(Order::find().count(&*app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged() {
    let app = TestApp::spawn().await;

    let response = app
        .post_webhook(&json!({
            "type": "customer.updated",
            "data": {"object": {"id": "cus_1"}}
        }))
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body, json!({"received": true}));
}

#[tokio::test]
async fn internal_failure_after_valid_signature_still_acknowledges() {
    let app = TestApp::spawn().await;

    // Session referenced by the event does not exist; migration fails
    // internally but the provider still gets its ack.
    let response = app
        .post_webhook(&json!({
            "type": "payment_intent.succeeded",
            "data": {"object": {
                "id": "pi_orphan",
                "metadata": {"session_id": "fs_missing"}
            }}
        }))
        .await;
    let body = json_body(response).await;
    assert_eq!(body, json!({"received": true}));
    assert_eq!(Order::find().count(&*app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn checkout_completion_activates_subscription_once() {
    let app = TestApp::spawn().await;
    app.enable_plan_checkout("care_basic", "price_test_basic").await;

    let user = expect_json(
        app.post_json(
            "/api/v1/users",
            json!({"email": "sub@example.com", "name": "Sub"}),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let user_id = user["data"]["id"].as_str().unwrap();

    let started = expect_json(
        app.post_json(
            "/api/v1/subscriptions/create",
            json!({"userId": user_id, "planId": "care_basic"}),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert!(started["data"]["checkoutUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://checkout.test/"));

    let sub = Subscription::find().one(&*app.db).await.unwrap().unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Pending);
    let checkout_session_id = sub.checkout_session_id.clone().unwrap();

    let event = json!({
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": checkout_session_id,
            "subscription": "sub_provider_1"
        }}
    });
    app.post_webhook(&event).await;
    app.post_webhook(&event).await;

    let sub = Subscription::find().one(&*app.db).await.unwrap().unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.provider_subscription_id.as_deref(), Some("sub_provider_1"));
    assert!(sub.current_period_start.is_some());
    assert!(sub.current_period_end.is_some());
    assert_eq!(Subscription::find().count(&*app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn invoice_payments_are_recorded_once() {
    let app = TestApp::spawn().await;

    let event = json!({
        "type": "invoice.payment_succeeded",
        "data": {"object": {
            "id": "in_test_1",
            "subscription": "sub_provider_9",
            "amount_paid": 49900,
            "currency": "inr"
        }}
    });
    app.post_webhook(&event).await;
    app.post_webhook(&event).await;

    assert_eq!(Payment::find().count(&*app.db).await.unwrap(), 1);
    let payment = Payment::find().one(&*app.db).await.unwrap().unwrap();
    assert_eq!(payment.invoice_id, "in_test_1");
    assert_eq!(payment.status, "paid");
    assert_eq!(payment.currency, "INR");
}
