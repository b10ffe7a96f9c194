use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{error, info, instrument, warn};

use crate::errors::ServiceError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub fn routes() -> Router<AppState> {
    Router::new().route("/stripe/webhook", post(receive_webhook))
}

/// Parsed `Stripe-Signature` header.
struct SignatureHeader {
    timestamp: i64,
    signature_hex: String,
}

fn parse_signature_header(header: &str) -> Option<SignatureHeader> {
    let mut timestamp = None;
    let mut signature_hex = None;
    for part in header.split(',') {
        let (key, value) = part.trim().split_once('=')?;
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signature_hex = Some(value.to_string()),
            _ => {}
        }
    }
    Some(SignatureHeader {
        timestamp: timestamp?,
        signature_hex: signature_hex?,
    })
}

/// Verifies the provider signature over `"{timestamp}.{body}"`.
/// Comparison is constant time via the MAC verify primitive.
pub fn verify_signature(
    secret: &str,
    header: &str,
    body: &[u8],
    tolerance_secs: i64,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let parsed = parse_signature_header(header)
        .ok_or_else(|| ServiceError::BadRequest("Malformed webhook signature".to_string()))?;

    let event_time = Utc
        .timestamp_opt(parsed.timestamp, 0)
        .single()
        .ok_or_else(|| ServiceError::BadRequest("Invalid webhook timestamp".to_string()))?;
    if (now - event_time).num_seconds().abs() > tolerance_secs {
        return Err(ServiceError::BadRequest(
            "Webhook timestamp outside tolerance".to_string(),
        ));
    }

    let expected = hex::decode(&parsed.signature_hex)
        .map_err(|_| ServiceError::BadRequest("Malformed webhook signature".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| ServiceError::InternalError("Invalid webhook secret".to_string()))?;
    mac.update(parsed.timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| ServiceError::BadRequest("Webhook signature mismatch".to_string()))
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    id: String,
    subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvoiceObject {
    id: String,
    subscription: Option<String>,
    #[serde(default)]
    amount_paid: i64,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    "inr".to_string()
}

/// Payment provider webhook endpoint.
///
/// Signature failures reject the request outright. After a verified
/// signature the endpoint always acknowledges; side-effect failures are
/// logged and left to the provider's retry queue.
#[utoipa::path(
    post,
    path = "/api/v1/stripe/webhook",
    request_body(content = Vec<u8>, content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Missing or invalid signature", body = crate::errors::ErrorResponse)
    ),
    tag = "webhooks"
)]
#[instrument(skip(state, headers, body))]
pub(crate) async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let secret = state.config.payment_webhook_secret.clone().ok_or_else(|| {
        error!("webhook received but no webhook secret is configured");
        ServiceError::InternalError("Webhook secret not configured".to_string())
    })?;

    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServiceError::BadRequest("Missing webhook signature".to_string()))?;

    verify_signature(
        &secret,
        signature,
        &body,
        state.config.payment_webhook_tolerance_secs as i64,
        Utc::now(),
    )?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("Malformed webhook payload: {}", e)))?;

    if let Err(e) = dispatch(&state, &event).await {
        // Acknowledge anyway; the provider retries and migration is
        // idempotent, so reprocessing is safe.
        error!(event_type = %event.event_type, error = %e, "webhook side effect failed");
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

async fn dispatch(state: &AppState, event: &WebhookEvent) -> Result<(), ServiceError> {
    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            let intent: PaymentIntentObject =
                serde_json::from_value(event.data.object.clone())?;
            let Some(session_id) = intent.metadata.get("session_id") else {
                warn!(intent_id = %intent.id, "payment intent without session metadata");
                return Ok(());
            };
            let outcome = state
                .services
                .checkout
                .migrate(session_id, &intent.id, None)
                .await?;
            info!(order_number = %outcome.order_number, "order created from webhook");
        }
        "checkout.session.completed" => {
            let session: CheckoutSessionObject =
                serde_json::from_value(event.data.object.clone())?;
            state
                .services
                .subscriptions
                .activate_from_checkout(&session.id, session.subscription, None, None)
                .await?;
        }
        "invoice.payment_succeeded" => {
            let invoice: InvoiceObject = serde_json::from_value(event.data.object.clone())?;
            state
                .services
                .subscriptions
                .record_invoice_payment(
                    &invoice.id,
                    invoice.subscription.as_deref(),
                    invoice.amount_paid,
                    &invoice.currency,
                )
                .await?;
        }
        other => {
            info!(event_type = other, "ignoring unhandled webhook event");
        }
    }
    Ok(())
}

/// Builds a valid signature header for a payload. Used by tests and the
/// local webhook replay tooling.
pub fn sign_payload(secret: &str, body: &[u8], timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={},v1={}", timestamp, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    #[test]
    fn valid_signature_passes() {
        let body = br#"{"type":"ping"}"#;
        let now = Utc::now();
        let header = sign_payload(SECRET, body, now.timestamp());
        assert!(verify_signature(SECRET, &header, body, 300, now).is_ok());
    }

    #[test]
    fn tampered_body_fails() {
        let now = Utc::now();
        let header = sign_payload(SECRET, b"original", now.timestamp());
        let err = verify_signature(SECRET, &header, b"tampered", 300, now).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn wrong_secret_fails() {
        let body = b"payload";
        let now = Utc::now();
        let header = sign_payload("whsec_other", body, now.timestamp());
        assert!(verify_signature(SECRET, &header, body, 300, now).is_err());
    }

    #[test]
    fn stale_timestamp_fails() {
        let body = b"payload";
        let now = Utc::now();
        let header = sign_payload(SECRET, body, now.timestamp() - 1000);
        assert!(verify_signature(SECRET, &header, body, 300, now).is_err());
    }

    #[test]
    fn malformed_header_fails() {
        let now = Utc::now();
        assert!(verify_signature(SECRET, "garbage", b"x", 300, now).is_err());
        assert!(verify_signature(SECRET, "t=abc,v1=00", b"x", 300, now).is_err());
        assert!(verify_signature(SECRET, "v1=00", b"x", 300, now).is_err());
    }
}
